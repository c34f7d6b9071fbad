//! Review endpoints.

use crate::auth::SessionUser;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use hotel_booking_core::error::AuthError;
use hotel_booking_core::pagination::Paginated;
use hotel_booking_core::types::{BookingId, HotelId, NewReview, NotificationKind, Review, ReviewId};
use hotel_booking_web::{PageQuery, WebResult};
use serde::Deserialize;

/// Review request. The booking must be the caller's completed stay.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// Completed booking at this hotel
    pub booking_id: BookingId,
    /// 1 to 5
    pub rating: u8,
    /// Free text
    #[serde(default)]
    pub comment: String,
}

/// Reviews of a hotel, newest first.
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
    Query(query): Query<PageQuery>,
) -> WebResult<Json<Paginated<Review>>> {
    Ok(Json(state.repos.reviews.list_by_hotel(hotel_id, query.page()).await?))
}

/// Review a completed stay and notify the hotel owner.
///
/// # Errors
///
/// - 422 for a rating outside 1..=5 or an unfinished booking
/// - 403 if the booking is not the caller's stay at this hotel
/// - 409 if the booking was already reviewed
pub async fn create_review(
    user: SessionUser,
    State(state): State<AppState>,
    Path(hotel_id): Path<HotelId>,
    Json(request): Json<CreateReviewRequest>,
) -> WebResult<(StatusCode, Json<Review>)> {
    let hotel = state.repos.hotels.get(hotel_id).await?;
    let review = state
        .repos
        .reviews
        .create(&NewReview {
            hotel_id,
            booking_id: request.booking_id,
            author_id: user.user_id,
            rating: request.rating,
            comment: request.comment.trim().to_string(),
        })
        .await?;

    tracing::info!(review_id = %review.id, hotel_id = %hotel_id, rating = review.rating, "Review created");
    state
        .notifier
        .notify_quietly(
            hotel.owner_id,
            NotificationKind::NewReview,
            format!("New {}-star review", review.rating),
            format!("{} received a new review", hotel.name),
            Some(*review.id.as_uuid()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Delete a review (author or admin).
pub async fn delete_review(
    user: SessionUser,
    State(state): State<AppState>,
    Path(review_id): Path<ReviewId>,
) -> WebResult<StatusCode> {
    let review = state.repos.reviews.get(review_id).await?;
    if !user.actor().can_manage(review.author_id) {
        return Err(AuthError::Forbidden.into());
    }

    state.repos.reviews.delete(review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
