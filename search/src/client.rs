//! Elasticsearch client implementation

use crate::query::{index_definition, search_body};
use async_trait::async_trait;
use hotel_booking_core::error::SearchError;
use hotel_booking_core::providers::{
    HealthCheck, HotelSearchDoc, SearchHit, SearchIndex, SearchQuery, SearchResults,
};
use hotel_booking_core::types::HotelId;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

/// Connection settings for [`ElasticsearchIndex`].
#[derive(Clone, Debug)]
pub struct ElasticsearchSettings {
    /// Base URL, e.g. `http://localhost:9200`
    pub url: String,
    /// Index name
    pub index: String,
    /// Basic-auth user
    pub username: Option<String>,
    /// Basic-auth password
    pub password: Option<String>,
}

/// Elasticsearch-backed [`SearchIndex`].
#[derive(Clone)]
pub struct ElasticsearchIndex {
    client: Client,
    settings: ElasticsearchSettings,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    total: Total,
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Total {
    Object { value: u64 },
    Number(u64),
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
}

impl ElasticsearchIndex {
    /// Create a client for `settings`.
    #[must_use]
    pub fn new(settings: ElasticsearchSettings) -> Self {
        let mut settings = settings;
        settings.url = settings.url.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// Index name this client writes to.
    #[must_use]
    pub fn index(&self) -> &str {
        &self.settings.index
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{path}", self.settings.url, self.settings.index)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.settings.username {
            Some(user) => request.basic_auth(user, self.settings.password.as_deref()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, SearchError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))
    }
}

async fn backend_error(response: reqwest::Response) -> SearchError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    SearchError::Backend { status, message }
}

fn parse_hits(response: SearchResponse) -> SearchResults {
    let total = match response.hits.total {
        Total::Object { value } | Total::Number(value) => value,
    };
    let hits = response
        .hits
        .hits
        .into_iter()
        .filter_map(|hit| match Uuid::parse_str(&hit.id) {
            Ok(id) => Some(SearchHit {
                hotel_id: HotelId::from_uuid(id),
                score: hit.score,
            }),
            Err(_) => {
                tracing::warn!(doc_id = %hit.id, "Skipping search hit with non-UUID id");
                None
            }
        })
        .collect();

    SearchResults { hits, total }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn ensure_index(&self) -> Result<(), SearchError> {
        let response = self
            .send(self.client.put(self.url("")).json(&index_definition()))
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(index = %self.settings.index, "Search index created");
                Ok(())
            }
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                if body.contains("resource_already_exists_exception") {
                    tracing::debug!(index = %self.settings.index, "Search index already exists");
                    Ok(())
                } else {
                    Err(SearchError::Backend {
                        status: StatusCode::BAD_REQUEST.as_u16(),
                        message: body,
                    })
                }
            }
            _ => Err(backend_error(response).await),
        }
    }

    async fn index_hotel(&self, doc: &HotelSearchDoc) -> Result<(), SearchError> {
        let url = self.url(&format!("/_doc/{}?refresh=wait_for", doc.hotel_id));
        let response = self.send(self.client.put(url).json(doc)).await?;

        if response.status().is_success() {
            tracing::debug!(hotel_id = %doc.hotel_id, "Hotel indexed");
            Ok(())
        } else {
            Err(backend_error(response).await)
        }
    }

    async fn remove_hotel(&self, hotel_id: HotelId) -> Result<(), SearchError> {
        let url = self.url(&format!("/_doc/{hotel_id}"));
        let response = self.send(self.client.delete(url)).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                tracing::debug!(hotel_id = %hotel_id, "Hotel was not indexed");
                Ok(())
            }
            _ => Err(backend_error(response).await),
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        let response = self
            .send(self.client.post(self.url("/_search")).json(&search_body(query)))
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        let parsed = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| SearchError::ResponseParse(e.to_string()))?;
        Ok(parse_hits(parsed))
    }
}

#[async_trait]
impl HealthCheck for ElasticsearchIndex {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn check(&self) -> Result<(), String> {
        let url = format!("{}/_cluster/health", self.settings.url);
        let response = self
            .send(self.client.get(url))
            .await
            .map_err(|e| e.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("cluster health returned {}", response.status()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn client(url: &str) -> ElasticsearchIndex {
        ElasticsearchIndex::new(ElasticsearchSettings {
            url: url.to_string(),
            index: "hotels".to_string(),
            username: None,
            password: None,
        })
    }

    #[test]
    fn urls_strip_trailing_slash() {
        let es = client("http://localhost:9200/");
        assert_eq!(es.url("/_search"), "http://localhost:9200/hotels/_search");
        assert_eq!(es.index(), "hotels");
    }

    #[test]
    fn parses_both_total_shapes() {
        let id = Uuid::new_v4();
        let modern: SearchResponse = serde_json::from_value(serde_json::json!({
            "hits": { "total": { "value": 7, "relation": "eq" },
                      "hits": [{ "_id": id.to_string(), "_score": 1.5 }, { "_id": "junk", "_score": null }] }
        }))
        .unwrap();
        let results = parse_hits(modern);
        assert_eq!(results.total, 7);
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].hotel_id, HotelId::from_uuid(id));

        let legacy: Result<SearchResponse, _> = serde_json::from_value(serde_json::json!({
            "hits": { "total": 3, "hits": [] }
        }));
        assert!(matches!(legacy.map(parse_hits), Ok(SearchResults { total: 3, .. })));
    }
}
