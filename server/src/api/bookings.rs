//! Booking endpoints.
//!
//! - POST /api/bookings - reserve units and create a pending booking
//! - GET /api/bookings/me - the caller's bookings
//! - GET /api/bookings/:id - one booking (customer, hotel owner or admin)
//! - POST /api/bookings/:id/cancel - cancel and restore units
//! - PATCH /api/bookings/:id/status - hotel-side status change
//! - GET /api/hotels/:id/bookings - bookings of a hotel (owner or admin)
//!
//! Ledger changes happen inside the repository transaction. Notifications
//! and metrics are recorded after it commits.

use crate::api::managed_hotel;
use crate::auth::SessionUser;
use crate::metrics;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use hotel_booking_core::error::{AuthError, BookingError, StoreError};
use hotel_booking_core::status::{can_view, may_book};
use hotel_booking_core::types::{Booking, BookingId, BookingStatus, HotelId, NewBooking, NotificationKind, RoomId};
use hotel_booking_web::WebResult;
use serde::Deserialize;
use std::time::Instant;

/// Booking request.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// Room to book
    pub room_id: RoomId,
    /// First night
    pub check_in: NaiveDate,
    /// Departure date
    pub check_out: NaiveDate,
    /// Units (default 1)
    #[serde(default = "one")]
    pub units: u32,
    /// Guests (default 1)
    #[serde(default = "one")]
    pub guests: u32,
    /// Free-text requests to the hotel
    pub special_requests: Option<String>,
}

const fn one() -> u32 {
    1
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status
    pub status: BookingStatus,
}

/// Notify the customer and the hotel owner about `booking`.
async fn notify_parties(state: &AppState, booking: &Booking, kind: NotificationKind, title: &str, body: &str) {
    let reference = Some(*booking.id.as_uuid());
    state
        .notifier
        .notify_quietly(booking.customer_id, kind, title, body, reference)
        .await;

    match state.repos.hotels.get(booking.hotel_id).await {
        Ok(hotel) => {
            state
                .notifier
                .notify_quietly(hotel.owner_id, kind, title, body, reference)
                .await;
        }
        Err(error) => {
            tracing::warn!(booking_id = %booking.id, %error, "Hotel lookup for booking notification failed");
        }
    }
}

/// Reserve units and create a pending booking.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/bookings \
///   -H "Authorization: Bearer <session_token>" \
///   -H "Content-Type: application/json" \
///   -d '{"room_id":"...","check_in":"2026-07-01","check_out":"2026-07-04","units":1,"guests":2}'
/// ```
///
/// # Errors
///
/// - 409 `ROOM_UNAVAILABLE` listing every blocked night
/// - 422 for invalid dates, units or guest counts
/// - 403 for hotel owners
pub async fn create_booking(
    user: SessionUser,
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> WebResult<(StatusCode, Json<Booking>)> {
    if !may_book(user.role) {
        return Err(AuthError::Forbidden.into());
    }

    let new_booking = NewBooking {
        customer_id: user.user_id,
        room_id: request.room_id,
        check_in: request.check_in,
        check_out: request.check_out,
        units: request.units,
        guests: request.guests,
        special_requests: request
            .special_requests
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };

    let started = Instant::now();
    let booking = match state.repos.bookings.create(&new_booking, state.clock.today()).await {
        Ok(booking) => booking,
        Err(StoreError::Domain(BookingError::RoomUnavailable { dates })) => {
            metrics::record_booking_conflict();
            tracing::info!(room_id = %request.room_id, blocked_nights = dates.len(), "Booking refused");
            return Err(BookingError::RoomUnavailable { dates }.into());
        }
        Err(other) => return Err(other.into()),
    };

    let nights = u32::try_from((booking.check_out - booking.check_in).num_days()).unwrap_or(0);
    metrics::record_booking_created(
        nights,
        booking.units,
        booking.total_price.cents(),
        started.elapsed().as_secs_f64(),
    );
    tracing::info!(
        booking_id = %booking.id,
        room_id = %booking.room_id,
        nights,
        units = booking.units,
        total_price = %booking.total_price,
        "Booking created"
    );

    let body = format!(
        "{} to {}, {} unit(s), {}",
        booking.check_in, booking.check_out, booking.units, booking.total_price
    );
    notify_parties(&state, &booking, NotificationKind::BookingCreated, "New booking", &body).await;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// The caller's bookings, newest first.
pub async fn my_bookings(user: SessionUser, State(state): State<AppState>) -> WebResult<Json<Vec<Booking>>> {
    Ok(Json(state.repos.bookings.list_by_customer(user.user_id).await?))
}

/// One booking.
///
/// Unrelated callers get 404 so booking ids cannot be probed.
pub async fn get_booking(
    user: SessionUser,
    State(state): State<AppState>,
    Path(booking_id): Path<BookingId>,
) -> WebResult<Json<Booking>> {
    let booking = state.repos.bookings.get(booking_id).await?;
    let hotel = state.repos.hotels.get(booking.hotel_id).await?;

    if can_view(&booking, &user.actor(), hotel.owner_id) {
        Ok(Json(booking))
    } else {
        Err(BookingError::BookingNotFound.into())
    }
}

/// Cancel a booking and restore its units.
///
/// # Errors
///
/// - 409 once the cancellation window has closed or the booking is terminal
/// - 403 for callers unrelated to the booking
pub async fn cancel_booking(
    user: SessionUser,
    State(state): State<AppState>,
    Path(booking_id): Path<BookingId>,
) -> WebResult<Json<Booking>> {
    let booking = state
        .repos
        .bookings
        .cancel(booking_id, &user.actor(), state.clock.today())
        .await?;

    metrics::record_booking_status(BookingStatus::Cancelled);
    tracing::info!(booking_id = %booking.id, cancelled_by = %user.user_id, "Booking cancelled");

    let body = format!("Booking for {} to {} was cancelled", booking.check_in, booking.check_out);
    notify_parties(&state, &booking, NotificationKind::BookingCancelled, "Booking cancelled", &body).await;

    Ok(Json(booking))
}

/// Hotel-side status change: confirm, reject, complete or cancel.
pub async fn update_booking_status(
    user: SessionUser,
    State(state): State<AppState>,
    Path(booking_id): Path<BookingId>,
    Json(request): Json<UpdateStatusRequest>,
) -> WebResult<Json<Booking>> {
    let booking = state
        .repos
        .bookings
        .update_status(booking_id, request.status, &user.actor(), state.clock.today())
        .await?;

    metrics::record_booking_status(booking.status);
    tracing::info!(booking_id = %booking.id, status = %booking.status, changed_by = %user.user_id, "Booking status changed");

    let kind = if booking.status == BookingStatus::Cancelled {
        NotificationKind::BookingCancelled
    } else {
        NotificationKind::BookingStatusChanged
    };
    let body = format!("Booking for {} to {} is now {}", booking.check_in, booking.check_out, booking.status);
    notify_parties(&state, &booking, kind, "Booking updated", &body).await;

    Ok(Json(booking))
}

/// Bookings of a hotel, by check-in.
pub async fn hotel_bookings(
    user: SessionUser,
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
) -> WebResult<Json<Vec<Booking>>> {
    managed_hotel(&state, &user, hotel_id).await?;
    Ok(Json(state.repos.bookings.list_by_hotel(hotel_id).await?))
}
