//! Domain types for the hotel booking marketplace.
//!
//! This module contains identifiers, value objects and entities shared by every
//! crate in the workspace. Persistence and transport layers convert to and from
//! these types at their boundaries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a platform user
    UserId
);
define_id!(
    /// Unique identifier for a hotel
    HotelId
);
define_id!(
    /// Unique identifier for a room type within a hotel
    RoomId
);
define_id!(
    /// Unique identifier for a booking
    BookingId
);
define_id!(
    /// Unique identifier for a review
    ReviewId
);
define_id!(
    /// Unique identifier for a chat room
    ChatRoomId
);
define_id!(
    /// Unique identifier for a chat message
    MessageId
);
define_id!(
    /// Unique identifier for a notification
    NotificationId
);

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole units (rounded down)
    #[must_use]
    pub const fn dollars(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Multiplies money by a quantity with overflow checking
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.dollars(), self.0 % 100)
    }
}

// ============================================================================
// Users
// ============================================================================

/// Platform role of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Books rooms and writes reviews
    Customer,
    /// Manages hotels, rooms and availability
    HotelOwner,
    /// Platform administrator
    Admin,
}

impl Role {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::HotelOwner => "hotel_owner",
            Self::Admin => "admin",
        }
    }

    /// Parse from the database representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Self::Customer),
            "hotel_owner" => Some(Self::HotelOwner),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered user account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: UserId,
    /// Lowercased email address (unique)
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Platform role
    pub role: Role,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Authorization context of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    /// Calling user
    pub user_id: UserId,
    /// Role of the calling user
    pub role: Role,
}

impl Actor {
    /// Create a new actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether the actor is a platform admin.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Whether the actor may act on a resource owned by `owner`.
    #[must_use]
    pub fn can_manage(&self, owner: UserId) -> bool {
        self.is_admin() || self.user_id == owner
    }
}

// ============================================================================
// Hotels & rooms
// ============================================================================

/// A hotel listed on the marketplace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    /// Hotel ID
    pub id: HotelId,
    /// Owning user (hotel owner)
    pub owner_id: UserId,
    /// Hotel name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Country
    pub country: String,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// Star rating (1..=5)
    pub star_rating: u8,
    /// Amenity tags
    pub amenities: Vec<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Hotel with aggregated review data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotelSummary {
    /// The hotel record
    #[serde(flatten)]
    pub hotel: Hotel,
    /// Mean review rating, `None` without reviews
    pub average_rating: Option<f64>,
    /// Number of reviews
    pub review_count: u32,
}

/// Fields for creating or replacing a hotel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotelDraft {
    /// Hotel name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Country
    pub country: String,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// Star rating (1..=5)
    pub star_rating: u8,
    /// Amenity tags
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl HotelDraft {
    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.city.trim().is_empty() || self.country.trim().is_empty() {
            return Err("city and country are required".to_string());
        }
        if !(1..=5).contains(&self.star_rating) {
            return Err("star_rating must be between 1 and 5".to_string());
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            return Err("latitude and longitude must be given together".to_string());
        }
        if self.latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            return Err("latitude must be between -90 and 90".to_string());
        }
        if self.longitude.is_some_and(|lon| !(-180.0..=180.0).contains(&lon)) {
            return Err("longitude must be between -180 and 180".to_string());
        }
        Ok(())
    }
}

/// Filter for hotel listings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelFilter {
    /// Exact city match (case-insensitive)
    pub city: Option<String>,
    /// Exact country match (case-insensitive)
    pub country: Option<String>,
    /// Minimum star rating
    pub min_stars: Option<u8>,
    /// Restrict to one owner
    pub owner_id: Option<UserId>,
}

/// A bookable room type. `total_units` identical rooms share one ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room ID
    pub id: RoomId,
    /// Hotel this room belongs to
    pub hotel_id: HotelId,
    /// Display name
    pub name: String,
    /// Room type tag (e.g. "double", "suite")
    pub room_type: String,
    /// Description
    pub description: String,
    /// Maximum guests per unit
    pub max_guests: u32,
    /// Default nightly price used when the owner opens nights without a price
    pub base_price: Money,
    /// Number of identical units
    pub total_units: u32,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating or replacing a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDraft {
    /// Display name
    pub name: String,
    /// Room type tag
    pub room_type: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Maximum guests per unit
    pub max_guests: u32,
    /// Default nightly price
    pub base_price: Money,
    /// Number of identical units
    pub total_units: u32,
}

impl RoomDraft {
    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.max_guests == 0 {
            return Err("max_guests must be at least 1".to_string());
        }
        if self.total_units == 0 {
            return Err("total_units must be at least 1".to_string());
        }
        if self.base_price.is_zero() {
            return Err("base_price must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// One (room, date) record holding price and remaining unit count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRow {
    /// Room
    pub room_id: RoomId,
    /// Night
    pub date: NaiveDate,
    /// Nightly price per unit
    pub price: Money,
    /// Units still bookable on this night
    pub available_units: u32,
}

// ============================================================================
// Bookings
// ============================================================================

/// Booking lifecycle state. See [`crate::status`] for transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Units held, awaiting owner confirmation
    Pending,
    /// Confirmed by the hotel
    Confirmed,
    /// Rejected by the hotel (units released)
    Rejected,
    /// Cancelled (units released)
    Cancelled,
    /// Stay finished
    Completed,
}

impl BookingStatus {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parse from the database representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A room booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Booking customer
    pub customer_id: UserId,
    /// Hotel of the booked room
    pub hotel_id: HotelId,
    /// Booked room
    pub room_id: RoomId,
    /// First night
    pub check_in: NaiveDate,
    /// Departure day (not charged)
    pub check_out: NaiveDate,
    /// Number of units booked per night
    pub units: u32,
    /// Number of guests
    pub guests: u32,
    /// Total charged price
    pub total_price: Money,
    /// Current status
    pub status: BookingStatus,
    /// Free-text requests
    pub special_requests: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Set when the booking is cancelled or rejected
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Input for a new booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    /// Booking customer
    pub customer_id: UserId,
    /// Room to book
    pub room_id: RoomId,
    /// First night
    pub check_in: NaiveDate,
    /// Departure day
    pub check_out: NaiveDate,
    /// Units per night
    pub units: u32,
    /// Number of guests
    pub guests: u32,
    /// Free-text requests
    pub special_requests: Option<String>,
}

// ============================================================================
// Reviews
// ============================================================================

/// A hotel review written after a completed stay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review ID
    pub id: ReviewId,
    /// Reviewed hotel
    pub hotel_id: HotelId,
    /// Booking the review is attached to
    pub booking_id: BookingId,
    /// Author (booking customer)
    pub author_id: UserId,
    /// Rating (1..=5)
    pub rating: u8,
    /// Review text
    pub comment: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for a new review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// Reviewed hotel
    pub hotel_id: HotelId,
    /// Completed booking
    pub booking_id: BookingId,
    /// Author
    pub author_id: UserId,
    /// Rating (1..=5)
    pub rating: u8,
    /// Review text
    pub comment: String,
}

// ============================================================================
// Chat
// ============================================================================

/// Messaging thread between two participants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    /// Room ID
    pub id: ChatRoomId,
    /// Participant with the smaller id
    pub participant_a: UserId,
    /// Participant with the larger id
    pub participant_b: UserId,
    /// Hotel the conversation is about
    pub hotel_id: Option<HotelId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the newest message
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ChatRoom {
    /// Order two participants canonically so a pair maps to one room.
    #[must_use]
    pub fn canonical_pair(a: UserId, b: UserId) -> (UserId, UserId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    /// Whether `user` takes part in this room.
    #[must_use]
    pub fn has_participant(&self, user: UserId) -> bool {
        self.participant_a == user || self.participant_b == user
    }

    /// The participant that is not `user`.
    #[must_use]
    pub fn other_participant(&self, user: UserId) -> UserId {
        if self.participant_a == user {
            self.participant_b
        } else {
            self.participant_a
        }
    }
}

/// A persisted chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message ID
    pub id: MessageId,
    /// Room
    pub room_id: ChatRoomId,
    /// Sender
    pub sender_id: UserId,
    /// Message text
    pub content: String,
    /// Sent timestamp
    pub created_at: DateTime<Utc>,
    /// Read timestamp (by the other participant)
    pub read_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Longest accepted message, in characters.
    pub const MAX_LENGTH: usize = 4_000;

    /// Check message text before persisting.
    ///
    /// # Errors
    ///
    /// Returns a message when the content is blank or too long.
    pub fn validate_content(content: &str) -> Result<(), String> {
        if content.trim().is_empty() {
            return Err("message must not be empty".to_string());
        }
        if content.chars().count() > Self::MAX_LENGTH {
            return Err(format!("message exceeds {} characters", Self::MAX_LENGTH));
        }
        Ok(())
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Category of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A booking was created
    BookingCreated,
    /// A booking changed status
    BookingStatusChanged,
    /// A booking was cancelled
    BookingCancelled,
    /// A chat message arrived
    NewMessage,
    /// A review was posted
    NewReview,
    /// Platform announcement
    System,
}

impl NotificationKind {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BookingCreated => "booking_created",
            Self::BookingStatusChanged => "booking_status_changed",
            Self::BookingCancelled => "booking_cancelled",
            Self::NewMessage => "new_message",
            Self::NewReview => "new_review",
            Self::System => "system",
        }
    }

    /// Parse from the database representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booking_created" => Some(Self::BookingCreated),
            "booking_status_changed" => Some(Self::BookingStatusChanged),
            "booking_cancelled" => Some(Self::BookingCancelled),
            "new_message" => Some(Self::NewMessage),
            "new_review" => Some(Self::NewReview),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// A user notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification ID
    pub id: NotificationId,
    /// Recipient
    pub user_id: UserId,
    /// Category
    pub kind: NotificationKind,
    /// Short title
    pub title: String,
    /// Body text
    pub body: String,
    /// Related entity (booking, room, review)
    pub reference_id: Option<Uuid>,
    /// Read flag
    pub read: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn money_display_pads_cents() {
        assert_eq!(Money::from_cents(12_005).to_string(), "$120.05");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn money_checked_multiply_overflows() {
        assert_eq!(Money::from_cents(u64::MAX).checked_multiply(2), None);
        assert_eq!(
            Money::from_cents(150).checked_multiply(3),
            Some(Money::from_cents(450))
        );
    }

    #[test]
    fn ids_serialize_as_plain_uuid() {
        let id = HotelId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }

    #[test]
    fn status_round_trips_through_db_string() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("archived"), None);
    }

    #[test]
    fn chat_pair_is_order_independent() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(ChatRoom::canonical_pair(a, b), ChatRoom::canonical_pair(b, a));
    }

    #[test]
    fn actor_admin_can_manage_anything() {
        let owner = UserId::new();
        let admin = Actor::new(UserId::new(), Role::Admin);
        let stranger = Actor::new(UserId::new(), Role::HotelOwner);
        assert!(admin.can_manage(owner));
        assert!(!stranger.can_manage(owner));
        assert!(Actor::new(owner, Role::HotelOwner).can_manage(owner));
    }

    #[test]
    fn hotel_draft_validation() {
        let mut draft = HotelDraft {
            name: "Harbour View".to_string(),
            description: String::new(),
            address: "1 Quay St".to_string(),
            city: "Lisbon".to_string(),
            country: "PT".to_string(),
            latitude: Some(38.7),
            longitude: Some(-9.1),
            star_rating: 4,
            amenities: vec![],
        };
        assert!(draft.validate().is_ok());

        draft.star_rating = 6;
        assert!(draft.validate().is_err());

        draft.star_rating = 3;
        draft.longitude = None;
        assert!(draft.validate().is_err());
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::HotelOwner).unwrap(), "\"hotel_owner\"");
    }
}
