//! # Hotel Search
//!
//! Elasticsearch mirror of the hotel catalogue.
//!
//! `PostgreSQL` stays the source of truth. Hotel create/update/delete push the
//! change here on a best-effort basis and an admin reindex rebuilds the whole
//! index from the database.
//!
//! ## Example
//!
//! ```no_run
//! use hotel_booking_core::providers::{SearchIndex, SearchQuery};
//! use hotel_booking_search::{ElasticsearchIndex, ElasticsearchSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let index = ElasticsearchIndex::new(ElasticsearchSettings {
//!     url: "http://localhost:9200".to_string(),
//!     index: "hotels".to_string(),
//!     username: None,
//!     password: None,
//! });
//! index.ensure_index().await?;
//!
//! let results = index
//!     .search(&SearchQuery { text: Some("sea view".to_string()), ..SearchQuery::default() })
//!     .await?;
//! println!("{} hotels", results.total);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod noop;
pub mod query;

pub use client::{ElasticsearchIndex, ElasticsearchSettings};
pub use noop::NoopSearchIndex;
