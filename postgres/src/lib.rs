//! `PostgreSQL` repositories for the hotel booking marketplace.
//!
//! This crate implements every repository trait from `hotel-booking-core`
//! over a shared [`PgPool`]:
//!
//! - Users, hotels (with review aggregates), rooms and the per-night
//!   availability ledger
//! - Bookings, whose create/cancel/status paths lock the ledger rows they
//!   touch and commit the booking and the unit changes atomically
//! - Reviews, chat rooms/messages and notifications
//!
//! Queries are built at runtime with `sqlx::query_as`, so the crate compiles
//! without a live database. Migrations are embedded from `./migrations`.
//!
//! # Example
//!
//! ```no_run
//! use hotel_booking_postgres::{PoolSettings, PostgresBookingRepository, connect, run_migrations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = connect(&PoolSettings::new("postgres://localhost/hotel_booking")).await?;
//! run_migrations(&pool).await?;
//! let bookings = PostgresBookingRepository::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod availability;
mod bookings;
mod chat;
mod error;
mod hotels;
mod notifications;
mod reviews;
mod rooms;
mod rows;
mod users;

pub use bookings::PostgresBookingRepository;
pub use chat::PostgresChatRepository;
pub use hotels::PostgresHotelRepository;
pub use notifications::PostgresNotificationRepository;
pub use reviews::PostgresReviewRepository;
pub use rooms::PostgresRoomRepository;
pub use users::PostgresUserRepository;

use async_trait::async_trait;
use hotel_booking_core::providers::HealthCheck;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Connection pool settings.
#[derive(Clone, Debug)]
pub struct PoolSettings {
    /// Connection URL
    pub url: String,
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// Timeout for acquiring a connection
    pub connect_timeout: Duration,
}

impl PoolSettings {
    /// Settings with default pool sizing for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Open a connection pool.
///
/// # Errors
///
/// Returns the `sqlx` error if the database is unreachable.
pub async fn connect(settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.connect_timeout)
        .connect(&settings.url)
        .await
}

/// Apply the embedded schema migrations.
///
/// # Errors
///
/// Returns the migration error if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations complete");
    Ok(())
}

/// Readiness probe running `SELECT 1`.
#[derive(Clone)]
pub struct PostgresHealth {
    pool: PgPool,
}

impl PostgresHealth {
    /// Create a probe over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for PostgresHealth {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> Result<(), String> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
