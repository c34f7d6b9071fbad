//! Axum integration layer for the hotel booking marketplace.
//!
//! The application crate owns routes and state. This crate holds the pieces
//! every handler leans on:
//!
//! - [`AppError`]: the single error type handlers return, with `From`
//!   conversions for every domain and provider error
//! - extractors for correlation ids, client IP, user agent and paging
//! - [`track_correlation_id`] middleware
//! - [`TopicBroadcaster`] and [`Subscriptions`] for WebSocket fan-out
//! - `/health` and `/ready` handlers
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use hotel_booking_web::{handlers, track_correlation_id};
//!
//! let app = Router::new()
//!     .route("/health", get(handlers::health_check))
//!     .layer(axum::middleware::from_fn(track_correlation_id));
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod broadcaster;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use broadcaster::{Subscriptions, TopicBroadcaster};
pub use error::AppError;
pub use extractors::{ClientIp, CorrelationId, PageQuery, UserAgent};
pub use middleware::{CORRELATION_ID_HEADER, track_correlation_id};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
