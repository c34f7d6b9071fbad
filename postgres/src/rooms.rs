//! `PostgreSQL` room repository and availability ledger CRUD.

use crate::availability::{Lock, load_rows, lock_room};
use crate::error::{db_error, to_i32, to_i64};
use crate::rows::{AvailabilityDbRow, BOOKING_COLUMNS, BookingRow, ROOM_COLUMNS, RoomRow, convert_all};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::ledger::{self, AvailabilityQuote};
use hotel_booking_core::providers::{RoomAvailability, RoomRepository};
use hotel_booking_core::stay::{DateWindow, StayRange};
use hotel_booking_core::types::{AvailabilityRow, Booking, HotelId, Room, RoomDraft, RoomId};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// `PostgreSQL` room repository.
#[derive(Clone)]
pub struct PostgresRoomRepository {
    pool: PgPool,
}

impl PostgresRoomRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    async fn create(&self, hotel_id: HotelId, draft: &RoomDraft) -> StoreResult<Room> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO rooms (id, hotel_id, name, room_type, description, max_guests, \
                 base_price_cents, total_units, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) RETURNING {ROOM_COLUMNS}"
        );
        let row: RoomRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(hotel_id.as_uuid())
            .bind(&draft.name)
            .bind(&draft.room_type)
            .bind(&draft.description)
            .bind(to_i32(draft.max_guests, "max_guests")?)
            .bind(to_i64(draft.base_price.cents(), "base_price")?)
            .bind(to_i32(draft.total_units, "total_units")?)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match db_error("create room")(e) {
                StoreError::Invalid(_) => StoreError::not_found("hotel", hotel_id),
                other => other,
            })?;

        let room = Room::try_from(row)?;
        tracing::info!(room_id = %room.id, hotel_id = %hotel_id, "Room created");
        Ok(room)
    }

    async fn get(&self, id: RoomId) -> StoreResult<Room> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1");
        let row: Option<RoomRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load room"))?;

        row.ok_or_else(|| StoreError::not_found("room", id))?.try_into()
    }

    async fn list_by_hotel(&self, hotel_id: HotelId) -> StoreResult<Vec<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE hotel_id = $1 ORDER BY name, id");
        let rows: Vec<RoomRow> = sqlx::query_as(&sql)
            .bind(hotel_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list rooms"))?;

        convert_all(rows)
    }

    #[tracing::instrument(skip(self, draft), fields(room_id = %id))]
    async fn update(&self, id: RoomId, draft: &RoomDraft) -> StoreResult<Room> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let sql = format!(
            "UPDATE rooms SET name = $2, room_type = $3, description = $4, max_guests = $5, \
                 base_price_cents = $6, total_units = $7, updated_at = $8 \
             WHERE id = $1 RETURNING {ROOM_COLUMNS}"
        );
        let total_units = to_i32(draft.total_units, "total_units")?;
        let row: Option<RoomRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .bind(&draft.name)
            .bind(&draft.room_type)
            .bind(&draft.description)
            .bind(to_i32(draft.max_guests, "max_guests")?)
            .bind(to_i64(draft.base_price.cents(), "base_price")?)
            .bind(total_units)
            .bind(Utc::now())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("update room"))?;
        let room = Room::try_from(row.ok_or_else(|| StoreError::not_found("room", id))?)?;

        let clamped = sqlx::query(
            "UPDATE room_availability SET available_units = $2 WHERE room_id = $1 AND available_units > $2",
        )
        .bind(id.as_uuid())
        .bind(total_units)
        .execute(&mut *tx)
        .await
        .map_err(db_error("clamp availability"))?;

        tx.commit().await.map_err(db_error("commit room update"))?;

        if clamped.rows_affected() > 0 {
            tracing::info!(nights = clamped.rows_affected(), "Clamped availability to new unit total");
        }
        Ok(room)
    }

    async fn delete(&self, id: RoomId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        // waits out bookings that hold the room FOR SHARE, so the count below sees them
        lock_room(&mut tx, id, Lock::ForUpdate)
            .await?
            .ok_or_else(|| StoreError::not_found("room", id))?;

        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE room_id = $1 AND status IN ('pending', 'confirmed')",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("count active bookings"))?;

        if active > 0 {
            return Err(StoreError::Conflict(format!(
                "room has {active} active booking(s)"
            )));
        }

        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_error("delete room"))?;

        tx.commit().await.map_err(db_error("commit room delete"))?;
        tracing::info!(room_id = %id, "Room deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self, rows), fields(room_id = %room_id, nights = rows.len()))]
    async fn upsert_availability(&self, room_id: RoomId, rows: &[AvailabilityRow]) -> StoreResult<u64> {
        let (Some(first), Some(last)) = (
            rows.iter().map(|r| r.date).min(),
            rows.iter().map(|r| r.date).max(),
        ) else {
            return Ok(0);
        };

        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;
        lock_room(&mut tx, room_id, Lock::ForShare)
            .await?
            .ok_or_else(|| StoreError::not_found("room", room_id))?;
        load_rows(&mut tx, room_id, first, last.succ_opt().unwrap_or(last), Lock::ForUpdate).await?;

        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE room_id = $1 AND status IN ('pending', 'confirmed') AND check_in <= $3 AND check_out > $2"
        );
        let active: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(room_id.as_uuid())
            .bind(first)
            .bind(last)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error("load active bookings"))?;
        let active: Vec<Booking> = convert_all(active)?;
        let rows = ledger::net_of_held(rows, &ledger::held_units(&active, room_id));

        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        let prices = rows
            .iter()
            .map(|r| to_i64(r.price.cents(), "price"))
            .collect::<StoreResult<Vec<i64>>>()?;
        let units = rows
            .iter()
            .map(|r| to_i32(r.available_units, "units"))
            .collect::<StoreResult<Vec<i32>>>()?;

        let result = sqlx::query(
            r"
            INSERT INTO room_availability (room_id, date, price_cents, available_units)
            SELECT $1, u.date, u.price, u.units
            FROM UNNEST($2::date[], $3::bigint[], $4::int[]) AS u(date, price, units)
            ON CONFLICT (room_id, date) DO UPDATE
            SET price_cents = EXCLUDED.price_cents,
                available_units = EXCLUDED.available_units
            ",
        )
        .bind(room_id.as_uuid())
        .bind(&dates)
        .bind(&prices)
        .bind(&units)
        .execute(&mut *tx)
        .await
        .map_err(db_error("upsert availability"))?;

        tx.commit().await.map_err(db_error("commit availability"))?;
        Ok(result.rows_affected())
    }

    async fn list_availability(&self, room_id: RoomId, window: &DateWindow) -> StoreResult<Vec<AvailabilityRow>> {
        let mut conn = self.pool.acquire().await.map_err(db_error("acquire connection"))?;
        load_rows(&mut conn, room_id, window.start(), window.end(), Lock::None).await
    }

    async fn delete_availability(&self, room_id: RoomId, window: &DateWindow) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM room_availability WHERE room_id = $1 AND date >= $2 AND date < $3")
            .bind(room_id.as_uuid())
            .bind(window.start())
            .bind(window.end())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete availability"))?;

        Ok(result.rows_affected())
    }

    async fn quote(&self, room_id: RoomId, stay: &StayRange, units: u32) -> StoreResult<AvailabilityQuote> {
        // unknown rooms are NotFound, not unavailable
        self.get(room_id).await?;

        let mut conn = self.pool.acquire().await.map_err(db_error("acquire connection"))?;
        let rows = load_rows(&mut conn, room_id, stay.check_in(), stay.check_out(), Lock::None).await?;
        Ok(ledger::quote(&rows, stay, units))
    }

    async fn available_rooms(&self, hotel_id: HotelId, stay: &StayRange, units: u32) -> StoreResult<Vec<RoomAvailability>> {
        let rooms = self.list_by_hotel(hotel_id).await?;
        if rooms.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<AvailabilityDbRow> = sqlx::query_as(
            r"
            SELECT ra.room_id, ra.date, ra.price_cents, ra.available_units
            FROM room_availability ra
            JOIN rooms r ON r.id = ra.room_id
            WHERE r.hotel_id = $1 AND ra.date >= $2 AND ra.date < $3
            ",
        )
            .bind(hotel_id.as_uuid())
            .bind(stay.check_in())
            .bind(stay.check_out())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load hotel availability"))?;
        let rows: Vec<AvailabilityRow> = convert_all(rows)?;

        let mut by_room: HashMap<RoomId, Vec<AvailabilityRow>> = HashMap::new();
        for row in rows {
            by_room.entry(row.room_id).or_default().push(row);
        }

        Ok(rooms
            .into_iter()
            .filter_map(|room| {
                let ledger_rows = by_room.get(&room.id).map_or(&[][..], Vec::as_slice);
                let quote = ledger::quote(ledger_rows, stay, units);
                quote.available.then_some(RoomAvailability { room, quote })
            })
            .collect())
    }
}
