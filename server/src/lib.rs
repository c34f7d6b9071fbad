//! Hotel booking marketplace server.
//!
//! Customers search hotels, book rooms against a per-night availability
//! ledger, chat with hotel owners and receive realtime notifications.
//!
//! # Architecture
//!
//! ```text
//!              HTTP / WebSocket (axum)
//!                       │
//!       ┌───────────────┼────────────────┐
//!       ▼               ▼                ▼
//!  Repositories    SessionStore      SearchIndex
//!  (PostgreSQL)      (Redis)       (Elasticsearch)
//!       │
//!       └── NotificationService ──► RealtimePublisher ──► Redis PUBLISH
//!                                                              │
//!                     RedisRelay (PSUBSCRIBE) ◄────────────────┘
//!                              │
//!                              ▼
//!                     TopicBroadcaster ──► WebSocket connections
//! ```
//!
//! # Booking consistency
//!
//! A booking locks the room and the stay's ledger rows, checks every night
//! and decrements the units in one transaction. Cancelling or rejecting a
//! booking gives the units back in the same way. See
//! `hotel_booking_core::ledger` for the planning rules every backend shares.

pub mod api;
pub mod auth;
pub mod config;
pub mod lifecycle;
pub mod metrics;
pub mod notifications;
pub mod realtime;
pub mod server;

pub use config::Config;
pub use lifecycle::{Application, StartupError};
pub use notifications::NotificationService;
pub use server::{AppState, Repositories, build_router};
