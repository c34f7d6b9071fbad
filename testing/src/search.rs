//! In-memory search index.

#![allow(clippy::unwrap_used)] // test infrastructure

use async_trait::async_trait;
use hotel_booking_core::error::SearchError;
use hotel_booking_core::providers::{
    GeoPoint, HotelSearchDoc, SearchHit, SearchIndex, SearchQuery, SearchResults,
};
use hotel_booking_core::types::HotelId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// [`SearchIndex`] over a `HashMap` of documents.
///
/// Text matching is a case-insensitive substring test on name, description
/// and city. Hits are ordered by name. No scores are produced.
#[derive(Clone, Debug, Default)]
pub struct InMemorySearchIndex {
    docs: Arc<RwLock<HashMap<HotelId, HotelSearchDoc>>>,
    failing: Arc<AtomicBool>,
}

impl InMemorySearchIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexed document for `hotel_id`.
    #[must_use]
    pub fn document(&self, hotel_id: HotelId) -> Option<HotelSearchDoc> {
        self.docs.read().unwrap().get(&hotel_id).cloned()
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().unwrap().len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().unwrap().is_empty()
    }

    /// Toggle backend failures for every operation.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SearchError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SearchError::RequestFailed("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Great-circle distance in kilometres.
fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

fn matches(doc: &HotelSearchDoc, query: &SearchQuery) -> bool {
    let text_ok = query
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .is_none_or(|text| {
            let needle = text.to_lowercase();
            [&doc.name, &doc.description, &doc.city]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        });

    text_ok
        && query
            .city
            .as_ref()
            .is_none_or(|c| doc.city.eq_ignore_ascii_case(c))
        && query
            .country
            .as_ref()
            .is_none_or(|c| doc.country.eq_ignore_ascii_case(c))
        && query.min_stars.is_none_or(|min| doc.star_rating >= min)
        && query.near.is_none_or(|near| {
            doc.location
                .is_some_and(|loc| haversine_km(near.point, loc) <= near.radius_km)
        })
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn ensure_index(&self) -> Result<(), SearchError> {
        self.check()
    }

    async fn index_hotel(&self, doc: &HotelSearchDoc) -> Result<(), SearchError> {
        self.check()?;
        self.docs.write().unwrap().insert(doc.hotel_id, doc.clone());
        Ok(())
    }

    async fn remove_hotel(&self, hotel_id: HotelId) -> Result<(), SearchError> {
        self.check()?;
        self.docs.write().unwrap().remove(&hotel_id);
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        self.check()?;
        let docs = self.docs.read().unwrap();
        let mut found: Vec<&HotelSearchDoc> = docs.values().filter(|d| matches(d, query)).collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.hotel_id.cmp(&b.hotel_id)));

        let total = found.len() as u64;
        let hits = query
            .page
            .slice(&found)
            .into_iter()
            .map(|doc| SearchHit {
                hotel_id: doc.hotel_id,
                score: None,
            })
            .collect();
        Ok(SearchResults { hits, total })
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;
    use hotel_booking_core::providers::GeoFilter;
    use hotel_booking_core::types::UserId;

    fn doc(name: &str, city: &str, stars: u8, location: Option<GeoPoint>) -> HotelSearchDoc {
        HotelSearchDoc {
            hotel_id: HotelId::new(),
            owner_id: UserId::new(),
            name: name.to_string(),
            description: format!("Rooms with a sea view in {city}"),
            city: city.to_string(),
            country: "Portugal".to_string(),
            star_rating: stars,
            amenities: Vec::new(),
            location,
        }
    }

    #[tokio::test]
    async fn filters_combine() {
        let index = InMemorySearchIndex::new();
        let lisbon = GeoPoint { lat: 38.7223, lon: -9.1393 };
        index.index_hotel(&doc("Alfama Inn", "Lisbon", 3, Some(lisbon))).await.unwrap();
        index.index_hotel(&doc("Belem Palace", "lisbon", 5, None)).await.unwrap();
        index.index_hotel(&doc("Ribeira House", "Porto", 4, None)).await.unwrap();

        let by_city = SearchQuery { city: Some("LISBON".into()), ..SearchQuery::default() };
        let results = index.search(&by_city).await.unwrap();
        assert_eq!(results.total, 2);

        let starred = SearchQuery { min_stars: Some(4), ..SearchQuery::default() };
        assert_eq!(index.search(&starred).await.unwrap().total, 2);

        let near = SearchQuery {
            near: Some(GeoFilter { point: lisbon, radius_km: 5.0 }),
            ..SearchQuery::default()
        };
        assert_eq!(index.search(&near).await.unwrap().total, 1);

        let text = SearchQuery { text: Some("ribeira".into()), ..SearchQuery::default() };
        assert_eq!(index.search(&text).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn failing_index_errors() {
        let index = InMemorySearchIndex::new();
        index.set_failing(true);
        assert!(index.search(&SearchQuery::default()).await.is_err());
        index.set_failing(false);
        assert!(index.search(&SearchQuery::default()).await.is_ok());
    }

    #[test]
    fn haversine_lisbon_porto() {
        let lisbon = GeoPoint { lat: 38.7223, lon: -9.1393 };
        let porto = GeoPoint { lat: 41.1579, lon: -8.6291 };
        let d = haversine_km(lisbon, porto);
        assert!((270.0..280.0).contains(&d), "got {d}");
        assert_eq!(haversine_km(lisbon, lisbon), 0.0);
    }
}
