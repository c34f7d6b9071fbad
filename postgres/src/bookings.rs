//! `PostgreSQL` booking repository.
//!
//! Every mutation runs in one transaction that locks the availability rows
//! it touches with `SELECT … FOR UPDATE`, so two customers racing for the last
//! unit serialize on the row lock and exactly one of them wins. Dropping the
//! transaction without `commit` rolls everything back.

use crate::availability::{Lock, apply_updates, load_rows, lock_room};
use crate::error::{db_error, to_i32, to_i64};
use crate::rows::{BOOKING_COLUMNS, BookingRow, convert_all};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use hotel_booking_core::error::{BookingError, StoreError, StoreResult};
use hotel_booking_core::ledger;
use hotel_booking_core::providers::BookingRepository;
use hotel_booking_core::stay::StayRange;
use hotel_booking_core::status;
use hotel_booking_core::types::{
    Actor, Booking, BookingId, BookingStatus, HotelId, NewBooking, UserId,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// `PostgreSQL` booking repository.
#[derive(Clone)]
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn lock_booking(conn: &mut PgConnection, id: BookingId) -> StoreResult<Booking> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
    let row: Option<BookingRow> = sqlx::query_as(&sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("lock booking"))?;

    row.ok_or(StoreError::Domain(BookingError::BookingNotFound))?
        .try_into()
}

async fn hotel_owner(conn: &mut PgConnection, hotel_id: HotelId) -> StoreResult<UserId> {
    let owner: Option<(Uuid,)> = sqlx::query_as("SELECT owner_id FROM hotels WHERE id = $1")
        .bind(hotel_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("load hotel owner"))?;

    owner
        .map(|(id,)| UserId::from_uuid(id))
        .ok_or_else(|| StoreError::not_found("hotel", hotel_id))
}

/// Give the booking's units back to every night that still has a row.
async fn release_units(conn: &mut PgConnection, booking: &Booking) -> StoreResult<()> {
    let stay = StayRange::new(booking.check_in, booking.check_out)?;
    let room = lock_room(conn, booking.room_id, Lock::ForShare).await?;
    let rows = load_rows(conn, booking.room_id, booking.check_in, booking.check_out, Lock::ForUpdate).await?;

    let mut plan = ledger::plan_release(&rows, &stay, booking.units);
    if let Some(room) = room {
        plan = plan.capped(room.total_units);
    }

    if !plan.is_complete() {
        tracing::warn!(
            booking_id = %booking.id,
            missing = plan.missing_dates.len(),
            "Availability rows deleted since booking; skipping those nights on release"
        );
    }

    apply_updates(conn, booking.room_id, &plan.updates).await?;
    Ok(())
}

async fn write_status(
    conn: &mut PgConnection,
    booking: &Booking,
    to: BookingStatus,
) -> StoreResult<Booking> {
    let now = Utc::now();
    let sql = format!(
        "UPDATE bookings SET status = $2, updated_at = $3, \
             cancelled_at = CASE WHEN $4 THEN $3 ELSE cancelled_at END \
         WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
    );
    let row: BookingRow = sqlx::query_as(&sql)
        .bind(booking.id.as_uuid())
        .bind(to.as_str())
        .bind(now)
        .bind(to == BookingStatus::Cancelled)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("update booking status"))?;

    row.try_into()
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    #[tracing::instrument(skip(self, request), fields(room_id = %request.room_id, units = request.units))]
    async fn create(&self, request: &NewBooking, today: NaiveDate) -> StoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let room = lock_room(&mut tx, request.room_id, Lock::ForShare)
            .await?
            .ok_or(StoreError::Domain(BookingError::RoomNotFound))?;
        let stay = ledger::check_request(request, &room, today)?;

        let rows = load_rows(&mut tx, room.id, stay.check_in(), stay.check_out(), Lock::ForUpdate).await?;
        let plan = ledger::plan_reservation(&rows, &stay, request.units)?;
        apply_updates(&mut tx, room.id, &plan.updates).await?;

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO bookings (id, customer_id, hotel_id, room_id, check_in, check_out, units, guests, \
                 total_price_cents, status, special_requests, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row: BookingRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(request.customer_id.as_uuid())
            .bind(room.hotel_id.as_uuid())
            .bind(room.id.as_uuid())
            .bind(stay.check_in())
            .bind(stay.check_out())
            .bind(to_i32(request.units, "units")?)
            .bind(to_i32(request.guests, "guests")?)
            .bind(to_i64(plan.total_price.cents(), "total_price")?)
            .bind(BookingStatus::Pending.as_str())
            .bind(request.special_requests.as_deref())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("insert booking"))?;
        let booking = Booking::try_from(row)?;

        tx.commit().await.map_err(db_error("commit booking"))?;
        Ok(booking)
    }

    async fn get(&self, id: BookingId) -> StoreResult<Booking> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load booking"))?;

        row.ok_or(StoreError::Domain(BookingError::BookingNotFound))?
            .try_into()
    }

    #[tracing::instrument(skip(self, actor), fields(booking_id = %id, actor = %actor.user_id))]
    async fn cancel(&self, id: BookingId, actor: &Actor, today: NaiveDate) -> StoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let booking = lock_booking(&mut tx, id).await?;
        let owner = hotel_owner(&mut tx, booking.hotel_id).await?;
        status::validate_cancellation(&booking, actor, owner, today)?;

        release_units(&mut tx, &booking).await?;
        let cancelled = write_status(&mut tx, &booking, BookingStatus::Cancelled).await?;

        tx.commit().await.map_err(db_error("commit cancellation"))?;

        tracing::info!(booking_id = %id, from = %booking.status, "Booking cancelled");
        Ok(cancelled)
    }

    #[tracing::instrument(skip(self, actor), fields(booking_id = %id, to = %to, actor = %actor.user_id))]
    async fn update_status(
        &self,
        id: BookingId,
        to: BookingStatus,
        actor: &Actor,
        today: NaiveDate,
    ) -> StoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let booking = lock_booking(&mut tx, id).await?;
        let owner = hotel_owner(&mut tx, booking.hotel_id).await?;
        status::validate_status_change(&booking, to, actor, owner, today)?;

        if status::releases_inventory(booking.status, to) {
            release_units(&mut tx, &booking).await?;
        }
        let updated = write_status(&mut tx, &booking, to).await?;

        tx.commit().await.map_err(db_error("commit status change"))?;

        tracing::info!(booking_id = %id, from = %booking.status, to = %to, "Booking status changed");
        Ok(updated)
    }

    async fn list_by_customer(&self, customer_id: UserId) -> StoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE customer_id = $1 ORDER BY created_at DESC"
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(customer_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list customer bookings"))?;

        convert_all(rows)
    }

    async fn list_by_hotel(&self, hotel_id: HotelId) -> StoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE hotel_id = $1 ORDER BY check_in, created_at"
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(hotel_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list hotel bookings"))?;

        convert_all(rows)
    }
}
