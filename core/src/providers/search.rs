//! Hotel search index trait and query types.

use crate::error::SearchError;
use crate::pagination::Page;
use crate::types::{Hotel, HotelId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// `lat`/`lon` pair, the shape Elasticsearch expects for `geo_point`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lon: f64,
}

/// "near" filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoFilter {
    /// Centre
    pub point: GeoPoint,
    /// Radius in kilometres
    pub radius_km: f64,
}

/// Document mirrored into the search index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotelSearchDoc {
    /// Hotel ID
    pub hotel_id: HotelId,
    /// Owner
    pub owner_id: UserId,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// City
    pub city: String,
    /// Country
    pub country: String,
    /// Star rating
    pub star_rating: u8,
    /// Amenity tags
    pub amenities: Vec<String>,
    /// Coordinates when known
    pub location: Option<GeoPoint>,
}

impl From<&Hotel> for HotelSearchDoc {
    fn from(hotel: &Hotel) -> Self {
        let location = match (hotel.latitude, hotel.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            _ => None,
        };
        Self {
            hotel_id: hotel.id,
            owner_id: hotel.owner_id,
            name: hotel.name.clone(),
            description: hotel.description.clone(),
            city: hotel.city.clone(),
            country: hotel.country.clone(),
            star_rating: hotel.star_rating,
            amenities: hotel.amenities.clone(),
            location,
        }
    }
}

/// Full-text and filter query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQuery {
    /// Free text over name, description and city
    pub text: Option<String>,
    /// Exact city
    pub city: Option<String>,
    /// Exact country
    pub country: Option<String>,
    /// Minimum stars
    pub min_stars: Option<u8>,
    /// Distance filter
    pub near: Option<GeoFilter>,
    /// Page
    pub page: Page,
}

/// One search hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matching hotel
    pub hotel_id: HotelId,
    /// Relevance score, absent for filter-only queries
    pub score: Option<f64>,
}

/// Search response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Hits in relevance order
    pub hits: Vec<SearchHit>,
    /// Total matches across all pages
    pub total: u64,
}

/// Hotel search index.
///
/// Kept in sync on a best-effort basis: callers log failures and carry on.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create the index with its mapping if missing.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the backend is unreachable or rejects the mapping.
    async fn ensure_index(&self) -> Result<(), SearchError>;

    /// Insert or replace a hotel document.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport or backend failure.
    async fn index_hotel(&self, doc: &HotelSearchDoc) -> Result<(), SearchError>;

    /// Remove a hotel document. Removing an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport or backend failure.
    async fn remove_hotel(&self, hotel_id: HotelId) -> Result<(), SearchError>;

    /// Run a query.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport, backend or decode failure.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError>;
}
