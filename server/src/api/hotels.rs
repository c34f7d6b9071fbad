//! Hotel endpoints.
//!
//! - GET /api/hotels - list summaries with filters
//! - POST /api/hotels - create (hotel owners and admins)
//! - GET /api/hotels/:id - summary with review aggregate
//! - PUT /api/hotels/:id - update (owner or admin)
//! - DELETE /api/hotels/:id - delete with rooms, ledger and bookings

use crate::api::{managed_hotel, sync_search};
use crate::auth::SessionUser;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::types::{Hotel, HotelDraft, HotelFilter, HotelId, HotelSummary, Role};
use hotel_booking_web::{AppError, WebResult};
use serde::Deserialize;

/// Query parameters for listing hotels.
#[derive(Debug, Default, Deserialize)]
pub struct ListHotelsQuery {
    /// Exact city
    pub city: Option<String>,
    /// Exact country
    pub country: Option<String>,
    /// Minimum star rating
    pub min_stars: Option<u8>,
    /// 1-based page
    pub page: Option<u32>,
    /// Page size (default 20, max 100)
    pub page_size: Option<u32>,
}

fn validated(draft: &HotelDraft) -> WebResult<()> {
    draft.validate().map_err(AppError::validation)
}

/// List hotels.
///
/// ```bash
/// curl 'http://localhost:8080/api/hotels?city=Lisbon&min_stars=4&page=1'
/// ```
pub async fn list_hotels(
    State(state): State<AppState>,
    Query(query): Query<ListHotelsQuery>,
) -> WebResult<Json<Paginated<HotelSummary>>> {
    let filter = HotelFilter {
        city: query.city,
        country: query.country,
        min_stars: query.min_stars,
        owner_id: None,
    };
    let page = Page::new(query.page, query.page_size);
    Ok(Json(state.repos.hotels.list(&filter, page).await?))
}

/// Create a hotel owned by the caller and index it.
///
/// # Errors
///
/// 403 for customers, 422 for an invalid draft.
pub async fn create_hotel(
    user: SessionUser,
    State(state): State<AppState>,
    Json(draft): Json<HotelDraft>,
) -> WebResult<(StatusCode, Json<Hotel>)> {
    user.require_role(&[Role::HotelOwner, Role::Admin])?;
    validated(&draft)?;

    let hotel = state.repos.hotels.create(user.user_id, &draft).await?;
    tracing::info!(hotel_id = %hotel.id, owner_id = %user.user_id, "Hotel created");
    sync_search(&state, &hotel).await;

    Ok((StatusCode::CREATED, Json(hotel)))
}

/// Hotel summary.
pub async fn get_hotel(
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
) -> WebResult<Json<HotelSummary>> {
    Ok(Json(state.repos.hotels.get_summary(hotel_id).await?))
}

/// Replace a hotel's editable fields and reindex it.
pub async fn update_hotel(
    user: SessionUser,
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
    Json(draft): Json<HotelDraft>,
) -> WebResult<Json<Hotel>> {
    managed_hotel(&state, &user, hotel_id).await?;
    validated(&draft)?;

    let hotel = state.repos.hotels.update(hotel_id, &draft).await?;
    sync_search(&state, &hotel).await;
    Ok(Json(hotel))
}

/// Delete a hotel and drop it from the index.
pub async fn delete_hotel(
    user: SessionUser,
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
) -> WebResult<StatusCode> {
    managed_hotel(&state, &user, hotel_id).await?;
    state.repos.hotels.delete(hotel_id).await?;
    tracing::info!(hotel_id = %hotel_id, deleted_by = %user.user_id, "Hotel deleted");

    if let Err(error) = state.search.remove_hotel(hotel_id).await {
        tracing::warn!(hotel_id = %hotel_id, %error, "Failed to unindex hotel");
    }
    Ok(StatusCode::NO_CONTENT)
}
