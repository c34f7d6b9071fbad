//! `GET /api/hotels/search` backed by the search index.
//!
//! The index only returns ids; every hit is hydrated from the database so
//! clients see the same summary shape as `GET /api/hotels`.

use crate::server::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use hotel_booking_core::error::StoreError;
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::providers::{GeoFilter, GeoPoint, SearchQuery};
use hotel_booking_core::types::HotelSummary;
use hotel_booking_web::{AppError, WebResult};
use serde::Deserialize;

/// Radius used when `lat`/`lon` are given without `radius_km`.
const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Free text
    pub q: Option<String>,
    /// Exact city
    pub city: Option<String>,
    /// Exact country
    pub country: Option<String>,
    /// Minimum stars
    pub min_stars: Option<u8>,
    /// Latitude of the "near" point
    pub lat: Option<f64>,
    /// Longitude of the "near" point
    pub lon: Option<f64>,
    /// Distance from the point
    pub radius_km: Option<f64>,
    /// 1-based page
    pub page: Option<u32>,
    /// Page size
    pub page_size: Option<u32>,
}

impl SearchParams {
    fn into_query(self) -> WebResult<SearchQuery> {
        let near = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(AppError::validation("lat/lon out of range"));
                }
                let radius_km = self.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
                if radius_km <= 0.0 || !radius_km.is_finite() {
                    return Err(AppError::validation("radius_km must be positive"));
                }
                Some(GeoFilter {
                    point: GeoPoint { lat, lon },
                    radius_km,
                })
            }
            (None, None) => None,
            _ => return Err(AppError::validation("lat and lon must be given together")),
        };

        Ok(SearchQuery {
            text: self.q.filter(|q| !q.trim().is_empty()),
            city: self.city,
            country: self.country,
            min_stars: self.min_stars,
            near,
            page: Page::new(self.page, self.page_size),
        })
    }
}

/// Search hotels.
///
/// ```bash
/// curl 'http://localhost:8080/api/hotels/search?q=beach&lat=38.72&lon=-9.14&radius_km=5'
/// ```
///
/// # Errors
///
/// 503 while the search backend is unreachable.
pub async fn search_hotels(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> WebResult<Json<Paginated<HotelSummary>>> {
    let query = params.into_query()?;
    let results = state.search.search(&query).await?;

    let mut summaries = Vec::with_capacity(results.hits.len());
    for hit in &results.hits {
        match state.repos.hotels.get_summary(hit.hotel_id).await {
            Ok(summary) => summaries.push(summary),
            Err(StoreError::NotFound { .. }) => {
                tracing::debug!(hotel_id = %hit.hotel_id, "Skipping stale search hit");
            }
            Err(other) => return Err(other.into()),
        }
    }

    Ok(Json(Paginated::new(summaries, results.total, query.page)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn near_filter_needs_both_coordinates() {
        let params = SearchParams {
            lat: Some(38.7),
            ..SearchParams::default()
        };
        assert_eq!(params.into_query().unwrap_err().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let params = SearchParams {
            lat: Some(38.7),
            lon: Some(-9.1),
            ..SearchParams::default()
        };
        let near = params.into_query().unwrap().near.unwrap();
        assert!((near.radius_km - DEFAULT_RADIUS_KM).abs() < f64::EPSILON);
    }

    #[test]
    fn blank_text_is_dropped() {
        let params = SearchParams {
            q: Some("   ".into()),
            ..SearchParams::default()
        };
        assert_eq!(params.into_query().unwrap().text, None);
    }
}
