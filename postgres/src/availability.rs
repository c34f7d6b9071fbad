//! Ledger statements shared by the room and booking repositories.
//!
//! Transactions that touch both tables lock the `rooms` row before any
//! `room_availability` row.

use crate::error::{db_error, to_i32};
use crate::rows::{AVAILABILITY_COLUMNS, AvailabilityDbRow, ROOM_COLUMNS, RoomRow, convert_all};
use chrono::NaiveDate;
use hotel_booking_core::error::StoreResult;
use hotel_booking_core::ledger::NightUpdate;
use hotel_booking_core::types::{AvailabilityRow, Room, RoomId};
use sqlx::PgConnection;

/// Row lock taken by a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lock {
    /// Plain read
    None,
    /// `FOR SHARE`, held until the transaction ends
    ForShare,
    /// `FOR UPDATE`, held until the transaction ends
    ForUpdate,
}

impl Lock {
    const fn clause(self) -> &'static str {
        match self {
            Self::None => "",
            Self::ForShare => " FOR SHARE",
            Self::ForUpdate => " FOR UPDATE",
        }
    }
}

/// Read the `rooms` row of `id` under `lock`.
pub(crate) async fn lock_room(conn: &mut PgConnection, id: RoomId, lock: Lock) -> StoreResult<Option<Room>> {
    let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1{}", lock.clause());
    let row: Option<RoomRow> = sqlx::query_as(&sql)
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("lock room"))?;

    row.map(Room::try_from).transpose()
}

/// Ledger rows of `room_id` in `[start, end)`, by date.
pub(crate) async fn load_rows(
    conn: &mut PgConnection,
    room_id: RoomId,
    start: NaiveDate,
    end: NaiveDate,
    lock: Lock,
) -> StoreResult<Vec<AvailabilityRow>> {
    let sql = format!(
        "SELECT {AVAILABILITY_COLUMNS} FROM room_availability \
         WHERE room_id = $1 AND date >= $2 AND date < $3 ORDER BY date{}",
        lock.clause()
    );
    let rows: Vec<AvailabilityDbRow> = sqlx::query_as(&sql)
        .bind(room_id.as_uuid())
        .bind(start)
        .bind(end)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("load availability"))?;

    convert_all(rows)
}

/// Write new unit counts for `room_id` in one statement.
pub(crate) async fn apply_updates(
    conn: &mut PgConnection,
    room_id: RoomId,
    updates: &[NightUpdate],
) -> StoreResult<u64> {
    if updates.is_empty() {
        return Ok(0);
    }

    let dates: Vec<NaiveDate> = updates.iter().map(|u| u.date).collect();
    let units = updates
        .iter()
        .map(|u| to_i32(u.available_units, "available_units"))
        .collect::<StoreResult<Vec<i32>>>()?;

    let result = sqlx::query(
        r"
        UPDATE room_availability AS ra
        SET available_units = u.units
        FROM UNNEST($2::date[], $3::int[]) AS u(date, units)
        WHERE ra.room_id = $1 AND ra.date = u.date
        ",
    )
    .bind(room_id.as_uuid())
    .bind(&dates)
    .bind(&units)
    .execute(&mut *conn)
    .await
    .map_err(db_error("update availability"))?;

    Ok(result.rows_affected())
}
