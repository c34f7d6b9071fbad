//! # Hotel Booking Testing
//!
//! In-memory backends and fixtures for the hotel booking marketplace.
//!
//! This crate provides:
//! - [`InMemoryBackend`]: every repository over one shared in-memory database,
//!   running the same ledger planning as the `PostgreSQL` backend
//! - [`InMemorySessionStore`], [`InMemorySearchIndex`] and
//!   [`RecordingPublisher`] for the remaining providers
//! - [`FixedClock`] for deterministic "today"
//! - [`fixtures`] to seed a marketplace, plus proptest strategies
//!
//! ## Example
//!
//! ```
//! use hotel_booking_core::providers::BookingRepository;
//! use hotel_booking_testing::fixtures::{Marketplace, date, new_booking};
//! use hotel_booking_testing::InMemoryBackend;
//!
//! # tokio_test::block_on(async {
//! let backend = InMemoryBackend::new();
//! let from = date(2026, 7, 1);
//! let market = Marketplace::seed(&backend, from, 10, 2).await;
//!
//! let request = new_booking(market.customer.id, market.room.id, from, 3, 1);
//! let booking = backend.bookings.create(&request, date(2026, 6, 1)).await.unwrap();
//!
//! assert_eq!(backend.units_on(market.room.id, from), Some(1));
//! assert_eq!(booking.total_price.cents(), 30_000);
//! # });
//! ```

pub mod clock;
pub mod fixtures;
pub mod memory;
pub mod realtime;
pub mod search;
pub mod sessions;

// Re-export commonly used items
pub use clock::{FixedClock, test_clock};
pub use memory::{
    InMemoryBackend, InMemoryBookingStore, InMemoryChatStore, InMemoryDb, InMemoryHotelStore,
    InMemoryNotificationStore, InMemoryReviewStore, InMemoryRoomStore, InMemoryUserStore, SharedDb,
};
pub use realtime::RecordingPublisher;
pub use search::InMemorySearchIndex;
pub use sessions::InMemorySessionStore;
