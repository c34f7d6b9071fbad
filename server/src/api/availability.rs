//! Availability ledger endpoints.
//!
//! Owners open nights with a price and a unit count; guests read quotes
//! computed from the same rows the booking transaction locks.

use crate::api::rooms::managed_room;
use crate::auth::SessionUser;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use hotel_booking_core::error::BookingError;
use hotel_booking_core::ledger::{AvailabilityQuote, expand_window};
use hotel_booking_core::providers::RoomAvailability;
use hotel_booking_core::stay::{DateWindow, StayRange};
use hotel_booking_core::types::{AvailabilityRow, HotelId, Money, RoomId};
use hotel_booking_web::WebResult;
use serde::{Deserialize, Serialize};

/// `[start, end)` window query.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowQuery {
    /// First night
    pub start: NaiveDate,
    /// Exclusive end
    pub end: NaiveDate,
}

/// Nights to open or re-price.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UpsertAvailabilityRequest {
    /// First night
    pub start: NaiveDate,
    /// Exclusive end
    pub end: NaiveDate,
    /// Nightly price
    pub price_cents: u64,
    /// Units sellable on each night
    pub units: u32,
}

/// Stay query for quotes and room search.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StayQuery {
    /// Check-in date
    pub check_in: NaiveDate,
    /// Check-out date
    pub check_out: NaiveDate,
    /// Units wanted (default 1)
    #[serde(default = "one")]
    pub units: u32,
}

const fn one() -> u32 {
    1
}

impl StayQuery {
    fn stay(&self) -> Result<StayRange, BookingError> {
        if self.units == 0 {
            return Err(BookingError::InvalidUnits);
        }
        StayRange::new(self.check_in, self.check_out)
    }
}

/// Number of ledger rows written or removed.
#[derive(Debug, Serialize)]
pub struct RowsAffected {
    /// Row count
    pub rows: u64,
}

/// Ledger rows of a room inside the window.
pub async fn list_availability(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<WindowQuery>,
) -> WebResult<Json<Vec<AvailabilityRow>>> {
    let window = DateWindow::new(query.start, query.end)?;
    state.repos.rooms.get(room_id).await?;
    Ok(Json(state.repos.rooms.list_availability(room_id, &window).await?))
}

/// Open or overwrite every night of the window.
///
/// `units` is the night's stock; units already booked stay off sale.
///
/// # Errors
///
/// - 422 for a zero price, an invalid window or units above the room total
/// - 403 unless the caller manages the hotel
pub async fn upsert_availability(
    user: SessionUser,
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(request): Json<UpsertAvailabilityRequest>,
) -> WebResult<Json<RowsAffected>> {
    let room = managed_room(&state, &user, room_id).await?;
    let window = DateWindow::new(request.start, request.end)?;
    let rows = expand_window(&room, &window, Money::from_cents(request.price_cents), request.units)?;

    let written = state.repos.rooms.upsert_availability(room_id, &rows).await?;
    tracing::info!(
        room_id = %room_id,
        start = %window.start(),
        end = %window.end(),
        units = request.units,
        rows = written,
        "Availability upserted"
    );
    Ok(Json(RowsAffected { rows: written }))
}

/// Remove the nights of the window from sale.
pub async fn delete_availability(
    user: SessionUser,
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<WindowQuery>,
) -> WebResult<Json<RowsAffected>> {
    managed_room(&state, &user, room_id).await?;
    let window = DateWindow::new(query.start, query.end)?;

    let removed = state.repos.rooms.delete_availability(room_id, &window).await?;
    tracing::info!(room_id = %room_id, rows = removed, "Availability deleted");
    Ok(Json(RowsAffected { rows: removed }))
}

/// Price and availability of a stay.
pub async fn quote(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<StayQuery>,
) -> WebResult<Json<AvailabilityQuote>> {
    let stay = query.stay()?;
    Ok(Json(state.repos.rooms.quote(room_id, &stay, query.units).await?))
}

/// Rooms of a hotel bookable for the whole stay.
pub async fn available_rooms(
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
    Query(query): Query<StayQuery>,
) -> WebResult<Json<Vec<RoomAvailability>>> {
    let stay = query.stay()?;
    state.repos.hotels.get(hotel_id).await?;
    Ok(Json(
        state.repos.rooms.available_rooms(hotel_id, &stay, query.units).await?,
    ))
}
