//! Admin operations.

use crate::auth::SessionUser;
use crate::server::AppState;
use axum::{Json, extract::State};
use hotel_booking_core::providers::HotelSearchDoc;
use hotel_booking_core::types::Role;
use hotel_booking_web::WebResult;
use serde::Serialize;

/// Reindex outcome.
#[derive(Debug, Serialize)]
pub struct ReindexReport {
    /// Hotels written to the index
    pub indexed: usize,
    /// Hotels that failed to index
    pub failed: usize,
}

/// Rebuild the search index from the database.
///
/// # Errors
///
/// - 403 for non-admins
/// - 503 if the index cannot be created
pub async fn reindex_search(user: SessionUser, State(state): State<AppState>) -> WebResult<Json<ReindexReport>> {
    user.require_role(&[Role::Admin])?;
    state.search.ensure_index().await?;

    let hotels = state.repos.hotels.all().await?;
    let mut report = ReindexReport { indexed: 0, failed: 0 };
    for hotel in &hotels {
        match state.search.index_hotel(&HotelSearchDoc::from(hotel)).await {
            Ok(()) => report.indexed += 1,
            Err(error) => {
                report.failed += 1;
                tracing::warn!(hotel_id = %hotel.id, %error, "Reindex failed for hotel");
            }
        }
    }

    tracing::info!(indexed = report.indexed, failed = report.failed, "Search index rebuilt");
    Ok(Json(report))
}
