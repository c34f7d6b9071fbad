//! Builders for domain values and seeded marketplaces.

#![allow(clippy::expect_used)] // fixtures are only called from tests

use crate::memory::InMemoryBackend;
use chrono::Days;
use hotel_booking_core::NaiveDate;
use hotel_booking_core::providers::{HotelRepository, NewUser, RoomRepository, UserRepository};
use hotel_booking_core::stay::DateWindow;
use hotel_booking_core::types::{
    Hotel, HotelDraft, Money, NewBooking, Role, Room, RoomDraft, RoomId, User, UserId,
};

/// Calendar date.
///
/// # Panics
///
/// If the date does not exist.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// `days` after `from`.
///
/// # Panics
///
/// On calendar overflow.
#[must_use]
pub fn days_after(from: NaiveDate, days: u64) -> NaiveDate {
    from.checked_add_days(Days::new(days)).expect("date in range")
}

/// Registration record with a placeholder hash.
#[must_use]
pub fn new_user(email: &str, role: Role) -> NewUser {
    NewUser {
        email: email.to_lowercase(),
        full_name: format!("Test {}", role.as_str()),
        role,
        password_hash: "not-a-real-hash".to_string(),
    }
}

/// Three-star hotel in `city`.
#[must_use]
pub fn hotel_draft(name: &str, city: &str) -> HotelDraft {
    HotelDraft {
        name: name.to_string(),
        description: format!("{name} in the heart of {city}"),
        address: "1 Main Street".to_string(),
        city: city.to_string(),
        country: "Portugal".to_string(),
        latitude: None,
        longitude: None,
        star_rating: 3,
        amenities: vec!["wifi".to_string()],
    }
}

/// Double room with `total_units` units at 100.00 per night.
#[must_use]
pub fn room_draft(total_units: u32) -> RoomDraft {
    RoomDraft {
        name: "Double".to_string(),
        room_type: "double".to_string(),
        description: "Two guests, garden view".to_string(),
        max_guests: 2,
        base_price: Money::from_cents(10_000),
        total_units,
    }
}

/// One-guest request for `units` of `room_id` over `[check_in, check_in + nights)`.
#[must_use]
pub fn new_booking(customer_id: UserId, room_id: RoomId, check_in: NaiveDate, nights: u64, units: u32) -> NewBooking {
    NewBooking {
        customer_id,
        room_id,
        check_in,
        check_out: days_after(check_in, nights),
        units,
        guests: 1,
        special_requests: None,
    }
}

/// A hotel with one room whose ledger is open.
#[derive(Clone, Debug)]
pub struct Marketplace {
    /// Hotel owner
    pub owner: User,
    /// A customer with no bookings yet
    pub customer: User,
    /// The hotel
    pub hotel: Hotel,
    /// Its room
    pub room: Room,
}

impl Marketplace {
    /// Seed `backend` with an owner, a customer and a room of `total_units`
    /// units opened for `open_nights` nights starting at `from`.
    ///
    /// # Panics
    ///
    /// If any store call fails.
    pub async fn seed(backend: &InMemoryBackend, from: NaiveDate, open_nights: u64, total_units: u32) -> Self {
        let owner = backend
            .users
            .create(&new_user("owner@example.com", Role::HotelOwner))
            .await
            .expect("create owner");
        let customer = backend
            .users
            .create(&new_user("guest@example.com", Role::Customer))
            .await
            .expect("create customer");
        let hotel = backend
            .hotels
            .create(owner.id, &hotel_draft("Casa Azul", "Lisbon"))
            .await
            .expect("create hotel");
        let room = backend
            .rooms
            .create(hotel.id, &room_draft(total_units))
            .await
            .expect("create room");

        let window = DateWindow::new(from, days_after(from, open_nights)).expect("valid window");
        let rows = hotel_booking_core::ledger::expand_window(&room, &window, room.base_price, total_units)
            .expect("valid rows");
        backend
            .rooms
            .upsert_availability(room.id, &rows)
            .await
            .expect("open ledger");

        Self {
            owner,
            customer,
            hotel,
            room,
        }
    }
}

/// Proptest strategies for ledger scenarios.
pub mod strategies {
    use proptest::prelude::*;

    /// A booking attempt: offset from the first open night, length, units.
    #[derive(Clone, Copy, Debug)]
    pub struct Attempt {
        /// Nights after the first open night
        pub offset: u64,
        /// Stay length
        pub nights: u64,
        /// Units requested
        pub units: u32,
    }

    /// Attempts that fall inside a ledger open for `open_nights` nights with
    /// `total_units` units.
    pub fn attempt(open_nights: u64, total_units: u32) -> impl Strategy<Value = Attempt> {
        (0..open_nights)
            .prop_flat_map(move |offset| {
                let max_nights = (open_nights - offset).max(1);
                (Just(offset), 1..=max_nights, 1..=total_units)
            })
            .prop_map(|(offset, nights, units)| Attempt { offset, nights, units })
    }
}
