//! Provider traits.
//!
//! Every external dependency of the booking system sits behind one of these
//! traits. The server holds them as `Arc<dyn Trait>`:
//!
//! - **Production**: `hotel-booking-postgres`, Redis sessions/pub-sub and
//!   `hotel-booking-search`
//! - **Testing**: the in-memory stores in `hotel-booking-testing`
//!
//! Repositories that run booking transactions take an [`Actor`](crate::types::Actor)
//! and "today" so ownership and date rules are checked inside the same
//! transaction that touches the ledger.

pub mod repositories;
pub mod realtime;
pub mod search;
pub mod session;

pub use realtime::{RealtimeEvent, RealtimePublisher, chat_topic, user_topic};
pub use repositories::{
    BookingRepository, ChatRepository, HotelRepository, NewNotification, NewUser,
    NotificationRepository, ReviewRepository, RoomAvailability, RoomRepository, UserRepository,
};
pub use search::{GeoFilter, GeoPoint, HotelSearchDoc, SearchHit, SearchIndex, SearchQuery, SearchResults};
pub use session::{Session, SessionStore};

use async_trait::async_trait;

/// Readiness probe for one backing service.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Component name reported by `/ready`.
    fn name(&self) -> &'static str;

    /// Ping the component.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the component is unreachable.
    async fn check(&self) -> Result<(), String>;
}
