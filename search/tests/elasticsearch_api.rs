//! HTTP contract tests for the Elasticsearch index against a mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use hotel_booking_core::error::SearchError;
use hotel_booking_core::pagination::Page;
use hotel_booking_core::providers::{HotelSearchDoc, SearchIndex, SearchQuery};
use hotel_booking_core::types::{HotelId, UserId};
use hotel_booking_search::{ElasticsearchIndex, ElasticsearchSettings};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn index_for(server: &MockServer) -> ElasticsearchIndex {
    ElasticsearchIndex::new(ElasticsearchSettings {
        url: server.uri(),
        index: "hotels".to_string(),
        username: None,
        password: None,
    })
}

fn doc(hotel_id: HotelId) -> HotelSearchDoc {
    HotelSearchDoc {
        hotel_id,
        owner_id: UserId::new(),
        name: "Harbour Lights".to_string(),
        description: "Rooms over the water".to_string(),
        city: "Lisbon".to_string(),
        country: "PT".to_string(),
        star_rating: 4,
        amenities: vec!["wifi".to_string()],
        location: None,
    }
}

#[tokio::test]
async fn existing_index_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/hotels"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "type": "resource_already_exists_exception" },
            "status": 400
        })))
        .expect(1)
        .mount(&server)
        .await;

    index_for(&server).ensure_index().await.expect("already exists is fine");
}

#[tokio::test]
async fn bad_mapping_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/hotels"))
        .respond_with(ResponseTemplate::new(400).set_body_string("mapper_parsing_exception"))
        .mount(&server)
        .await;

    let err = index_for(&server).ensure_index().await.unwrap_err();
    assert!(matches!(err, SearchError::Backend { status: 400, .. }));
}

#[tokio::test]
async fn index_hotel_puts_document_by_id() {
    let server = MockServer::start().await;
    let hotel_id = HotelId::new();
    Mock::given(method("PUT"))
        .and(path(format!("/hotels/_doc/{hotel_id}")))
        .and(query_param("refresh", "wait_for"))
        .and(body_partial_json(json!({ "name": "Harbour Lights", "city": "Lisbon" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "result": "created" })))
        .expect(1)
        .mount(&server)
        .await;

    index_for(&server).index_hotel(&doc(hotel_id)).await.unwrap();
}

#[tokio::test]
async fn removing_unknown_hotel_is_ok() {
    let server = MockServer::start().await;
    let hotel_id = HotelId::new();
    Mock::given(method("DELETE"))
        .and(path(format!("/hotels/_doc/{hotel_id}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "result": "not_found" })))
        .expect(1)
        .mount(&server)
        .await;

    index_for(&server).remove_hotel(hotel_id).await.unwrap();
}

#[tokio::test]
async fn search_sends_text_query_and_parses_hits() {
    let server = MockServer::start().await;
    let first = HotelId::new();
    let second = HotelId::new();
    Mock::given(method("POST"))
        .and(path("/hotels/_search"))
        .and(body_partial_json(json!({
            "from": 20,
            "size": 20,
            "query": { "bool": { "must": [{ "multi_match": { "query": "sea view" } }] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": {
                "total": { "value": 22, "relation": "eq" },
                "hits": [
                    { "_id": first.to_string(), "_score": 3.2 },
                    { "_id": second.to_string(), "_score": 1.1 }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = SearchQuery {
        text: Some("sea view".to_string()),
        page: Page::new(Some(2), Some(20)),
        ..SearchQuery::default()
    };
    let results = index_for(&server).search(&query).await.unwrap();

    assert_eq!(results.total, 22);
    let ids: Vec<_> = results.hits.iter().map(|h| h.hotel_id).collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn server_errors_map_to_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hotels/_search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("cluster unavailable"))
        .mount(&server)
        .await;

    let err = index_for(&server)
        .search(&SearchQuery::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::Backend {
            status: 503,
            message: "cluster unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_response_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hotels/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = index_for(&server)
        .search(&SearchQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::ResponseParse(_)));
}

/// Runs against a real cluster when `TEST_ELASTICSEARCH_URL` is set.
#[tokio::test]
#[ignore = "requires TEST_ELASTICSEARCH_URL"]
async fn live_cluster_round_trip() {
    use hotel_booking_core::providers::{GeoFilter, GeoPoint};

    let url = std::env::var("TEST_ELASTICSEARCH_URL").expect("TEST_ELASTICSEARCH_URL must be set");
    let es = ElasticsearchIndex::new(ElasticsearchSettings {
        url,
        index: format!("hotels-test-{}", uuid::Uuid::new_v4().simple()),
        username: std::env::var("TEST_ELASTICSEARCH_USERNAME").ok(),
        password: std::env::var("TEST_ELASTICSEARCH_PASSWORD").ok(),
    });
    es.ensure_index().await.unwrap();
    es.ensure_index().await.expect("second create is idempotent");

    let hotel_id = HotelId::new();
    let mut harbour = doc(hotel_id);
    harbour.location = Some(GeoPoint { lat: 38.7071, lon: -9.1359 });
    es.index_hotel(&harbour).await.unwrap();

    let by_text = es
        .search(&SearchQuery {
            text: Some("harbour".to_string()),
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(by_text.total, 1);
    assert_eq!(by_text.hits[0].hotel_id, hotel_id);

    let far = es
        .search(&SearchQuery {
            near: Some(GeoFilter {
                point: GeoPoint { lat: 41.1579, lon: -8.6291 },
                radius_km: 50.0,
            }),
            ..SearchQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(far.total, 0);

    es.remove_hotel(hotel_id).await.unwrap();
    es.remove_hotel(hotel_id).await.expect("missing document is fine");
}
