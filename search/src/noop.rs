//! Search index used when Elasticsearch is disabled.

use async_trait::async_trait;
use hotel_booking_core::error::SearchError;
use hotel_booking_core::providers::{HotelSearchDoc, SearchIndex, SearchQuery, SearchResults};
use hotel_booking_core::types::HotelId;

/// Accepts every write and returns no hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSearchIndex;

#[async_trait]
impl SearchIndex for NoopSearchIndex {
    async fn ensure_index(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn index_hotel(&self, _doc: &HotelSearchDoc) -> Result<(), SearchError> {
        Ok(())
    }

    async fn remove_hotel(&self, _hotel_id: HotelId) -> Result<(), SearchError> {
        Ok(())
    }

    async fn search(&self, _query: &SearchQuery) -> Result<SearchResults, SearchError> {
        Ok(SearchResults::default())
    }
}
