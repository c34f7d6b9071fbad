//! Room endpoints.

use crate::api::managed_hotel;
use crate::auth::SessionUser;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use hotel_booking_core::types::{HotelId, Room, RoomDraft, RoomId};
use hotel_booking_web::{AppError, WebResult};

/// Load `room_id` and check that `user` manages its hotel.
pub(crate) async fn managed_room(state: &AppState, user: &SessionUser, room_id: RoomId) -> WebResult<Room> {
    let room = state.repos.rooms.get(room_id).await?;
    managed_hotel(state, user, room.hotel_id).await?;
    Ok(room)
}

/// Rooms of a hotel, by name.
pub async fn list_rooms(
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
) -> WebResult<Json<Vec<Room>>> {
    // 404 for unknown hotels rather than an empty list.
    state.repos.hotels.get(hotel_id).await?;
    Ok(Json(state.repos.rooms.list_by_hotel(hotel_id).await?))
}

/// Add a room to a hotel the caller manages.
pub async fn create_room(
    user: SessionUser,
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
    Json(draft): Json<RoomDraft>,
) -> WebResult<(StatusCode, Json<Room>)> {
    managed_hotel(&state, &user, hotel_id).await?;
    draft.validate().map_err(AppError::validation)?;

    let room = state.repos.rooms.create(hotel_id, &draft).await?;
    tracing::info!(room_id = %room.id, hotel_id = %hotel_id, total_units = room.total_units, "Room created");
    Ok((StatusCode::CREATED, Json(room)))
}

/// Room details.
pub async fn get_room(State(state): State<AppState>, Path(room_id): Path<RoomId>) -> WebResult<Json<Room>> {
    Ok(Json(state.repos.rooms.get(room_id).await?))
}

/// Replace a room's editable fields.
///
/// Lowering `total_units` clamps the room's ledger rows.
pub async fn update_room(
    user: SessionUser,
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(draft): Json<RoomDraft>,
) -> WebResult<Json<Room>> {
    managed_room(&state, &user, room_id).await?;
    draft.validate().map_err(AppError::validation)?;
    Ok(Json(state.repos.rooms.update(room_id, &draft).await?))
}

/// Delete a room and its ledger.
///
/// # Errors
///
/// 409 while active bookings still reference the room.
pub async fn delete_room(
    user: SessionUser,
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> WebResult<StatusCode> {
    managed_room(&state, &user, room_id).await?;
    state.repos.rooms.delete(room_id).await?;
    tracing::info!(room_id = %room_id, deleted_by = %user.user_id, "Room deleted");
    Ok(StatusCode::NO_CONTENT)
}
