//! In-memory repositories sharing one database.
//!
//! Every store holds a handle to the same [`InMemoryDb`], so a booking made
//! through [`InMemoryBookingStore`] is visible to [`InMemoryRoomStore`]
//! exactly as it would be in `PostgreSQL`. Mutations take the write lock for
//! their whole duration, which stands in for the row locks of the real
//! backend.

#![allow(clippy::unwrap_used)] // test infrastructure: lock poisoning only follows a panicking test

mod bookings;
mod chat;
mod hotels;
mod notifications;
mod reviews;
mod rooms;
mod users;

pub use bookings::InMemoryBookingStore;
pub use chat::InMemoryChatStore;
pub use hotels::InMemoryHotelStore;
pub use notifications::InMemoryNotificationStore;
pub use reviews::InMemoryReviewStore;
pub use rooms::InMemoryRoomStore;
pub use users::InMemoryUserStore;

use hotel_booking_core::NaiveDate;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::ledger::NightUpdate;
use hotel_booking_core::stay::DateWindow;
use hotel_booking_core::types::{
    AvailabilityRow, Booking, BookingId, ChatMessage, ChatRoom, ChatRoomId, Hotel, HotelId,
    Notification, Review, ReviewId, Room, RoomId, User, UserId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Tables of the in-memory database.
#[derive(Debug, Default)]
pub struct InMemoryDb {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) hotels: HashMap<HotelId, Hotel>,
    pub(crate) rooms: HashMap<RoomId, Room>,
    pub(crate) availability: BTreeMap<(RoomId, NaiveDate), AvailabilityRow>,
    pub(crate) bookings: HashMap<BookingId, Booking>,
    pub(crate) reviews: HashMap<ReviewId, Review>,
    pub(crate) chat_rooms: HashMap<ChatRoomId, ChatRoom>,
    /// Insertion order is send order.
    pub(crate) messages: Vec<ChatMessage>,
    /// Insertion order is creation order.
    pub(crate) notifications: Vec<Notification>,
}

/// Handle shared by every in-memory store.
pub type SharedDb = Arc<RwLock<InMemoryDb>>;

impl InMemoryDb {
    pub(crate) fn room(&self, id: RoomId) -> StoreResult<&Room> {
        self.rooms.get(&id).ok_or_else(|| StoreError::not_found("room", id))
    }

    pub(crate) fn hotel_owner(&self, id: HotelId) -> StoreResult<UserId> {
        self.hotels
            .get(&id)
            .map(|hotel| hotel.owner_id)
            .ok_or_else(|| StoreError::not_found("hotel", id))
    }

    /// Ledger rows of `room_id` inside `window`, by date.
    pub(crate) fn rows_in(&self, room_id: RoomId, window: &DateWindow) -> Vec<AvailabilityRow> {
        self.availability
            .range((room_id, window.start())..(room_id, window.end()))
            .map(|(_, row)| *row)
            .collect()
    }

    pub(crate) fn apply(&mut self, room_id: RoomId, updates: &[NightUpdate]) {
        for update in updates {
            if let Some(row) = self.availability.get_mut(&(room_id, update.date)) {
                row.available_units = update.available_units;
            }
        }
    }

    pub(crate) fn drop_room(&mut self, room_id: RoomId) {
        self.rooms.remove(&room_id);
        self.availability.retain(|(room, _), _| *room != room_id);
        self.bookings.retain(|_, booking| booking.room_id != room_id);
        let bookings = &self.bookings;
        self.reviews.retain(|_, review| bookings.contains_key(&review.booking_id));
    }
}

/// Every repository over one shared database.
#[derive(Clone)]
pub struct InMemoryBackend {
    db: SharedDb,
    /// Users
    pub users: InMemoryUserStore,
    /// Hotels
    pub hotels: InMemoryHotelStore,
    /// Rooms and availability
    pub rooms: InMemoryRoomStore,
    /// Bookings
    pub bookings: InMemoryBookingStore,
    /// Reviews
    pub reviews: InMemoryReviewStore,
    /// Chat
    pub chat: InMemoryChatStore,
    /// Notifications
    pub notifications: InMemoryNotificationStore,
}

impl InMemoryBackend {
    /// Create an empty database and a store for every table.
    #[must_use]
    pub fn new() -> Self {
        let db: SharedDb = Arc::default();
        Self {
            users: InMemoryUserStore::new(Arc::clone(&db)),
            hotels: InMemoryHotelStore::new(Arc::clone(&db)),
            rooms: InMemoryRoomStore::new(Arc::clone(&db)),
            bookings: InMemoryBookingStore::new(Arc::clone(&db)),
            reviews: InMemoryReviewStore::new(Arc::clone(&db)),
            chat: InMemoryChatStore::new(Arc::clone(&db)),
            notifications: InMemoryNotificationStore::new(Arc::clone(&db)),
            db,
        }
    }

    /// Raw database handle for assertions.
    #[must_use]
    pub fn db(&self) -> SharedDb {
        Arc::clone(&self.db)
    }

    /// Current units of one night, `None` if the row does not exist.
    #[must_use]
    pub fn units_on(&self, room_id: RoomId, date: NaiveDate) -> Option<u32> {
        self.db
            .read()
            .unwrap()
            .availability
            .get(&(room_id, date))
            .map(|row| row.available_units)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
