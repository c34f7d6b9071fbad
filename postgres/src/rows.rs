//! Database row shapes and their conversion into domain types.

use crate::error::{to_u32, to_u64};
use chrono::{DateTime, NaiveDate, Utc};
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::types::{
    AvailabilityRow, Booking, BookingStatus, ChatMessage, ChatRoom, Hotel, HotelSummary,
    Money, Notification, NotificationKind, Review, Role, Room, User,
};
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = "id, email, full_name, role, password_hash, created_at";

pub(crate) const HOTEL_COLUMNS: &str = "h.id, h.owner_id, h.name, h.description, h.address, h.city, h.country, \
     h.latitude, h.longitude, h.star_rating, h.amenities, h.created_at, h.updated_at";

pub(crate) const ROOM_COLUMNS: &str = "id, hotel_id, name, room_type, description, max_guests, \
     base_price_cents, total_units, created_at, updated_at";

pub(crate) const BOOKING_COLUMNS: &str = "id, customer_id, hotel_id, room_id, check_in, check_out, units, guests, \
     total_price_cents, status, special_requests, created_at, updated_at, cancelled_at";

pub(crate) const AVAILABILITY_COLUMNS: &str = "room_id, date, price_cents, available_units";

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    email: String,
    full_name: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Database(format!("unknown role {}", row.role)))?;
        Ok(Self {
            id: row.id.into(),
            email: row.email,
            full_name: row.full_name,
            role,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct HotelRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: String,
    address: String,
    city: String,
    country: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    star_rating: i16,
    amenities: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HotelRow> for Hotel {
    type Error = StoreError;

    fn try_from(row: HotelRow) -> StoreResult<Self> {
        let star_rating = u8::try_from(row.star_rating)
            .map_err(|_| StoreError::Database(format!("invalid star rating {}", row.star_rating)))?;
        Ok(Self {
            id: row.id.into(),
            owner_id: row.owner_id.into(),
            name: row.name,
            description: row.description,
            address: row.address,
            city: row.city,
            country: row.country,
            latitude: row.latitude,
            longitude: row.longitude,
            star_rating,
            amenities: row.amenities,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct HotelSummaryRow {
    #[sqlx(flatten)]
    hotel: HotelRow,
    average_rating: Option<f64>,
    review_count: i64,
}

impl TryFrom<HotelSummaryRow> for HotelSummary {
    type Error = StoreError;

    fn try_from(row: HotelSummaryRow) -> StoreResult<Self> {
        let review_count = u32::try_from(row.review_count)
            .map_err(|_| StoreError::Database("review count out of range".to_string()))?;
        Ok(Self {
            hotel: row.hotel.try_into()?,
            average_rating: row.average_rating,
            review_count,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RoomRow {
    id: Uuid,
    hotel_id: Uuid,
    name: String,
    room_type: String,
    description: String,
    max_guests: i32,
    base_price_cents: i64,
    total_units: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for Room {
    type Error = StoreError;

    fn try_from(row: RoomRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id.into(),
            hotel_id: row.hotel_id.into(),
            name: row.name,
            room_type: row.room_type,
            description: row.description,
            max_guests: to_u32(row.max_guests, "max_guests")?,
            base_price: Money::from_cents(to_u64(row.base_price_cents, "base_price_cents")?),
            total_units: to_u32(row.total_units, "total_units")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AvailabilityDbRow {
    room_id: Uuid,
    date: NaiveDate,
    price_cents: i64,
    available_units: i32,
}

impl TryFrom<AvailabilityDbRow> for AvailabilityRow {
    type Error = StoreError;

    fn try_from(row: AvailabilityDbRow) -> StoreResult<Self> {
        Ok(Self {
            room_id: row.room_id.into(),
            date: row.date,
            price: Money::from_cents(to_u64(row.price_cents, "price_cents")?),
            available_units: to_u32(row.available_units, "available_units")?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    customer_id: Uuid,
    hotel_id: Uuid,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    units: i32,
    guests: i32,
    total_price_cents: i64,
    status: String,
    special_requests: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> StoreResult<Self> {
        let status = BookingStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Database(format!("unknown booking status {}", row.status)))?;
        Ok(Self {
            id: row.id.into(),
            customer_id: row.customer_id.into(),
            hotel_id: row.hotel_id.into(),
            room_id: row.room_id.into(),
            check_in: row.check_in,
            check_out: row.check_out,
            units: to_u32(row.units, "units")?,
            guests: to_u32(row.guests, "guests")?,
            total_price: Money::from_cents(to_u64(row.total_price_cents, "total_price_cents")?),
            status,
            special_requests: row.special_requests,
            created_at: row.created_at,
            updated_at: row.updated_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReviewRow {
    id: Uuid,
    hotel_id: Uuid,
    booking_id: Uuid,
    author_id: Uuid,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> StoreResult<Self> {
        let rating = u8::try_from(row.rating)
            .map_err(|_| StoreError::Database(format!("invalid rating {}", row.rating)))?;
        Ok(Self {
            id: row.id.into(),
            hotel_id: row.hotel_id.into(),
            booking_id: row.booking_id.into(),
            author_id: row.author_id.into(),
            rating,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ChatRoomRow {
    id: Uuid,
    participant_a: Uuid,
    participant_b: Uuid,
    hotel_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    last_message_at: Option<DateTime<Utc>>,
}

impl From<ChatRoomRow> for ChatRoom {
    fn from(row: ChatRoomRow) -> Self {
        Self {
            id: row.id.into(),
            participant_a: row.participant_a.into(),
            participant_b: row.participant_b.into(),
            hotel_id: row.hotel_id.map(Into::into),
            created_at: row.created_at,
            last_message_at: row.last_message_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ChatMessageRow {
    id: Uuid,
    room_id: Uuid,
    sender_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: row.id.into(),
            room_id: row.room_id.into(),
            sender_id: row.sender_id.into(),
            content: row.content,
            created_at: row.created_at,
            read_at: row.read_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    body: String,
    reference_id: Option<Uuid>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> StoreResult<Self> {
        let kind = NotificationKind::parse(&row.kind)
            .ok_or_else(|| StoreError::Database(format!("unknown notification kind {}", row.kind)))?;
        Ok(Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            kind,
            title: row.title,
            body: row.body,
            reference_id: row.reference_id,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

/// Convert every row, failing on the first bad one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
