//! # Hotel Booking Core
//!
//! Domain types, the availability ledger and provider traits for the hotel
//! booking marketplace.
//!
//! ## Core Concepts
//!
//! - **Stay**: half-open `[check_in, check_out)` range; each date is one night
//! - **Availability row**: one (room, date) record with price and remaining units
//! - **Ledger**: pure planning functions every storage backend runs inside its
//!   own transaction
//! - **Status machine**: the legal booking status transitions and which of them
//!   give units back
//! - **Providers**: repository, session, search and realtime traits injected
//!   into the server
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use hotel_booking_core::ledger::plan_reservation;
//! use hotel_booking_core::stay::StayRange;
//! use hotel_booking_core::types::{AvailabilityRow, Money, RoomId};
//!
//! let room_id = RoomId::new();
//! let day = |d| NaiveDate::from_ymd_opt(2026, 7, d).unwrap_or_default();
//! let rows = vec![
//!     AvailabilityRow { room_id, date: day(1), price: Money::from_cents(10_000), available_units: 2 },
//!     AvailabilityRow { room_id, date: day(2), price: Money::from_cents(12_000), available_units: 2 },
//! ];
//!
//! let stay = StayRange::new(day(1), day(3)).map_err(|e| e.to_string())?;
//! let plan = plan_reservation(&rows, &stay, 1).map_err(|e| e.to_string())?;
//! assert_eq!(plan.total_price, Money::from_cents(22_000));
//! # Ok::<(), String>(())
//! ```

pub mod environment;
pub mod error;
pub mod ledger;
pub mod pagination;
pub mod providers;
pub mod status;
pub mod stay;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use environment::{Clock, SystemClock};
pub use error::{AuthError, BookingError, PublishError, SearchError, StoreError, StoreResult};
pub use pagination::{Page, Paginated};
