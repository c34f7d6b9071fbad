//! Repository traits for the marketplace entities.

use crate::error::StoreResult;
use crate::ledger::AvailabilityQuote;
use crate::pagination::{Page, Paginated};
use crate::stay::{DateWindow, StayRange};
use crate::types::{
    Actor, AvailabilityRow, Booking, BookingId, BookingStatus, ChatMessage, ChatRoom, ChatRoomId,
    Hotel, HotelDraft, HotelFilter, HotelId, HotelSummary, NewBooking, NewReview, Notification,
    NotificationId, NotificationKind, Review, ReviewId, Role, Room, RoomDraft, RoomId, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input for a new account. `password_hash` is already hashed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    /// Lowercased email
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Role
    pub role: Role,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// Input for a new notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNotification {
    /// Recipient
    pub user_id: UserId,
    /// Category
    pub kind: NotificationKind,
    /// Title
    pub title: String,
    /// Body
    pub body: String,
    /// Related entity
    pub reference_id: Option<Uuid>,
}

/// A room together with its quote for a requested stay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAvailability {
    /// The room
    pub room: Room,
    /// Quote for the stay
    pub quote: AvailabilityQuote,
}

/// User accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`](crate::error::StoreError::Conflict) if the email is taken.
    async fn create(&self, user: &NewUser) -> StoreResult<User>;

    /// Find a user by (lowercased) email.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Load a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    async fn find_by_id(&self, id: UserId) -> StoreResult<User>;
}

/// Hotels.
#[async_trait]
pub trait HotelRepository: Send + Sync {
    /// Create a hotel owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn create(&self, owner_id: UserId, draft: &HotelDraft) -> StoreResult<Hotel>;

    /// Load a hotel.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the hotel does not exist.
    async fn get(&self, id: HotelId) -> StoreResult<Hotel>;

    /// Load a hotel with its review aggregate.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the hotel does not exist.
    async fn get_summary(&self, id: HotelId) -> StoreResult<HotelSummary>;

    /// List hotel summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list(&self, filter: &HotelFilter, page: Page) -> StoreResult<Paginated<HotelSummary>>;

    /// Replace a hotel's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the hotel does not exist.
    async fn update(&self, id: HotelId, draft: &HotelDraft) -> StoreResult<Hotel>;

    /// Delete a hotel with its rooms, ledger rows, bookings and reviews.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the hotel does not exist.
    async fn delete(&self, id: HotelId) -> StoreResult<()>;

    /// Hotels owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Hotel>>;

    /// Every hotel, for reindexing.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn all(&self) -> StoreResult<Vec<Hotel>>;
}

/// Rooms and their availability ledger.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Create a room in `hotel_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the hotel does not exist.
    async fn create(&self, hotel_id: HotelId, draft: &RoomDraft) -> StoreResult<Room>;

    /// Load a room.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room does not exist.
    async fn get(&self, id: RoomId) -> StoreResult<Room>;

    /// Rooms of a hotel ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list_by_hotel(&self, hotel_id: HotelId) -> StoreResult<Vec<Room>>;

    /// Replace a room's editable fields.
    ///
    /// Lowering `total_units` clamps existing ledger rows to the new total.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room does not exist.
    async fn update(&self, id: RoomId, draft: &RoomDraft) -> StoreResult<Room>;

    /// Delete a room with its ledger.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the room does not exist
    /// - `Conflict` if active bookings still reference it
    async fn delete(&self, id: RoomId) -> StoreResult<()>;

    /// Insert or overwrite ledger rows. Returns the number of rows written.
    ///
    /// Each row's `available_units` is the stock the owner opens for that
    /// night; units held by pending or confirmed bookings are subtracted
    /// before it is stored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room does not exist.
    async fn upsert_availability(&self, room_id: RoomId, rows: &[AvailabilityRow]) -> StoreResult<u64>;

    /// Ledger rows of a room inside `window`, by date.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list_availability(&self, room_id: RoomId, window: &DateWindow) -> StoreResult<Vec<AvailabilityRow>>;

    /// Delete ledger rows inside `window`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn delete_availability(&self, room_id: RoomId, window: &DateWindow) -> StoreResult<u64>;

    /// Quote `units` of a room for `stay`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room does not exist.
    async fn quote(&self, room_id: RoomId, stay: &StayRange, units: u32) -> StoreResult<AvailabilityQuote>;

    /// Rooms of a hotel bookable for the whole stay.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn available_rooms(&self, hotel_id: HotelId, stay: &StayRange, units: u32) -> StoreResult<Vec<RoomAvailability>>;
}

/// Bookings. Mutations are transactional against the ledger.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Reserve units and insert a `Pending` booking in one transaction.
    ///
    /// # Errors
    ///
    /// - `Domain(RoomNotFound)` if the room does not exist
    /// - `Domain(..)` for stay, units, guests and availability rule violations
    async fn create(&self, booking: &NewBooking, today: NaiveDate) -> StoreResult<Booking>;

    /// Load a booking.
    ///
    /// # Errors
    ///
    /// Returns `Domain(BookingNotFound)` if the booking does not exist.
    async fn get(&self, id: BookingId) -> StoreResult<Booking>;

    /// Cancel a booking and restore its units.
    ///
    /// # Errors
    ///
    /// Returns `Domain(..)` for authorization, window and transition rule violations.
    async fn cancel(&self, id: BookingId, actor: &Actor, today: NaiveDate) -> StoreResult<Booking>;

    /// Move a booking to `to`, restoring units when the transition releases them.
    ///
    /// # Errors
    ///
    /// Returns `Domain(..)` for authorization and transition rule violations.
    async fn update_status(
        &self,
        id: BookingId,
        to: BookingStatus,
        actor: &Actor,
        today: NaiveDate,
    ) -> StoreResult<Booking>;

    /// Bookings of a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list_by_customer(&self, customer_id: UserId) -> StoreResult<Vec<Booking>>;

    /// Bookings of a hotel, by check-in.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list_by_hotel(&self, hotel_id: HotelId) -> StoreResult<Vec<Booking>>;
}

/// Reviews.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Create a review for a completed booking.
    ///
    /// # Errors
    ///
    /// - `Invalid` for a rating outside 1..=5 or a booking that is not completed
    /// - `Forbidden` if the booking is not the author's or not for that hotel
    /// - `Conflict` if the booking already has a review
    async fn create(&self, review: &NewReview) -> StoreResult<Review>;

    /// Reviews of a hotel, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list_by_hotel(&self, hotel_id: HotelId, page: Page) -> StoreResult<Paginated<Review>>;

    /// Load a review.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the review does not exist.
    async fn get(&self, id: ReviewId) -> StoreResult<Review>;

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the review does not exist.
    async fn delete(&self, id: ReviewId) -> StoreResult<()>;
}

/// Chat rooms and messages.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Return the room for the pair, creating it on first contact.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when both participants are the same user.
    async fn get_or_create_room(&self, a: UserId, b: UserId, hotel_id: Option<HotelId>) -> StoreResult<ChatRoom>;

    /// Load a room.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the room does not exist.
    async fn get_room(&self, id: ChatRoomId) -> StoreResult<ChatRoom>;

    /// Rooms of a user, most recent activity first.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list_rooms(&self, user_id: UserId) -> StoreResult<Vec<ChatRoom>>;

    /// Persist a message.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the room does not exist
    /// - `Forbidden` if `sender_id` is not a participant
    async fn add_message(&self, room_id: ChatRoomId, sender_id: UserId, content: &str) -> StoreResult<ChatMessage>;

    /// Up to `limit` messages older than `before`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list_messages(
        &self,
        room_id: ChatRoomId,
        before: Option<DateTime<Utc>>,
        limit: u32,
    ) -> StoreResult<Vec<ChatMessage>>;

    /// Mark the other participant's messages read. Returns the number updated.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn mark_read(&self, room_id: ChatRoomId, reader_id: UserId) -> StoreResult<u64>;
}

/// Notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a notification.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn create(&self, notification: &NewNotification) -> StoreResult<Notification>;

    /// Notifications of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn list(&self, user_id: UserId, unread_only: bool, page: Page) -> StoreResult<Paginated<Notification>>;

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` unless the notification belongs to `user_id`.
    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> StoreResult<Notification>;

    /// Mark every notification of a user read. Returns the number updated.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn mark_all_read(&self, user_id: UserId) -> StoreResult<u64>;

    /// Delete a notification.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` unless the notification belongs to `user_id`.
    async fn delete(&self, id: NotificationId, user_id: UserId) -> StoreResult<()>;

    /// Unread notifications of a user.
    ///
    /// # Errors
    ///
    /// Returns a database error on failure.
    async fn unread_count(&self, user_id: UserId) -> StoreResult<u64>;
}
