//! Operational endpoints, hotel CRUD with index sync, and search.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::TestApp;
use hotel_booking_core::types::{HotelId, Role};
use hotel_booking_web::CORRELATION_ID_HEADER;
use serde_json::json;
use tower::ServiceExt;

fn hotel_id(raw: &str) -> HotelId {
    serde_json::from_value(json!(raw)).unwrap()
}

#[tokio::test]
async fn operational_endpoints() {
    let app = TestApp::new();

    let (status, health) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");

    let (status, ready) = app.get("/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["ready"], true);

    // No recorder installed in tests.
    let (status, _) = app.get("/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn correlation_id_is_echoed() {
    let app = TestApp::new();
    let id = "0f8fad5b-d9cb-469f-a165-70867728950e";
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(CORRELATION_ID_HEADER, id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()[CORRELATION_ID_HEADER], id);
}

#[tokio::test]
async fn hotel_lifecycle_keeps_index_in_sync() {
    let app = TestApp::new();
    let (owner_token, raw_id, _) = app.seed_hotel(2).await;
    let id = hotel_id(&raw_id);
    let (_, rival_token) = app.sign_in("rival@example.com", Role::HotelOwner).await;
    let (_, guest_token) = app.sign_in("guest@example.com", Role::Customer).await;

    assert_eq!(app.search.document(id).unwrap().name, "Casa Azul");

    let (status, listed) = app.get("/api/hotels?city=Lisbon&min_stars=4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["items"][0]["review_count"], 0);

    let (_, none) = app.get("/api/hotels?min_stars=5", None).await;
    assert_eq!(none["total"], 0);

    let (status, _) = app
        .post(
            "/api/hotels",
            Some(&guest_token),
            json!({"name": "Nope", "address": "x", "city": "y", "country": "z", "star_rating": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/api/hotels",
            Some(&owner_token),
            json!({"name": "Bad", "address": "x", "city": "y", "country": "z", "star_rating": 9}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let renamed = json!({
        "name": "Casa Verde",
        "address": "Rua Azul 1",
        "city": "Lisbon",
        "country": "Portugal",
        "latitude": 38.7223,
        "longitude": -9.1393,
        "star_rating": 5
    });
    let uri = format!("/api/hotels/{raw_id}");
    let (status, _) = app
        .request(Method::PUT, &uri, Some(&rival_token), Some(renamed.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .request(Method::PUT, &uri, Some(&owner_token), Some(renamed))
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["star_rating"], 5);
    assert_eq!(app.search.document(id).unwrap().name, "Casa Verde");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.search.document(id).is_none());

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn index_outage_does_not_block_writes() {
    let app = TestApp::new();
    app.search.set_failing(true);
    let (_, raw_id, _) = app.seed_hotel(1).await;

    let (status, _) = app.get(&format!("/api/hotels/{raw_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.search.is_empty());
}

#[tokio::test]
async fn search_filters_and_outage() {
    let app = TestApp::new();
    app.seed_hotel(1).await;

    let (status, found) = app.get("/api/hotels/search?q=casa", None).await;
    assert_eq!(status, StatusCode::OK, "{found}");
    assert_eq!(found["total"], 1);
    assert_eq!(found["items"][0]["name"], "Casa Azul");

    let (_, nearby) = app
        .get("/api/hotels/search?lat=38.72&lon=-9.14&radius_km=5", None)
        .await;
    assert_eq!(nearby["total"], 1);

    // Porto is about 275 km north.
    let (_, far) = app
        .get("/api/hotels/search?lat=41.1579&lon=-8.6291&radius_km=50", None)
        .await;
    assert_eq!(far["total"], 0);

    let (status, _) = app.get("/api/hotels/search?lat=38.72", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    app.search.set_failing(true);
    let (status, body) = app.get("/api/hotels/search?q=casa", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn admin_reindex_rebuilds_documents() {
    let app = TestApp::new();
    let (owner_token, raw_id, _) = app.seed_hotel(1).await;
    let (_, admin_token) = app.sign_in("admin@example.com", Role::Admin).await;

    app.search.set_failing(true);
    let (status, report) = app.post("/api/admin/search/reindex", Some(&admin_token), json!({})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{report}");
    app.search.set_failing(false);

    let (status, _) = app.post("/api/admin/search/reindex", Some(&owner_token), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = app.post("/api/admin/search/reindex", Some(&admin_token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["indexed"], 1);
    assert_eq!(report["failed"], 0);
    assert!(app.search.document(hotel_id(&raw_id)).is_some());
}

#[tokio::test]
async fn room_crud_clamps_ledger_and_guards_active_bookings() {
    let app = TestApp::new();
    let (owner_token, hotel, room) = app.seed_hotel(2).await;
    let (_, rival_token) = app.sign_in("rival@example.com", Role::HotelOwner).await;
    let (_, guest_token) = app.sign_in("guest@example.com", Role::Customer).await;

    let (status, rooms) = app.get(&format!("/api/hotels/{hotel}/rooms"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rooms.as_array().unwrap().len(), 1);

    let smaller = json!({
        "name": "Double",
        "room_type": "double",
        "max_guests": 2,
        "base_price": 10_000,
        "total_units": 1
    });
    let uri = format!("/api/rooms/{room}");
    let (status, _) = app
        .request(Method::PUT, &uri, Some(&rival_token), Some(smaller.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app.request(Method::PUT, &uri, Some(&owner_token), Some(smaller)).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["total_units"], 1);

    let night = common::first_night();
    let (_, quote) = app
        .get(
            &format!(
                "/api/rooms/{room}/quote?check_in={night}&check_out={}&units=2",
                night + chrono::Duration::days(1)
            ),
            None,
        )
        .await;
    assert_eq!(quote["available"], false);

    let (status, booking) = app
        .post(
            "/api/bookings",
            Some(&guest_token),
            json!({
                "room_id": room,
                "check_in": night,
                "check_out": night + chrono::Duration::days(2),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let booking_id = booking["id"].as_str().unwrap();
    let (status, _) = app
        .post(&format!("/api/bookings/{booking_id}/cancel"), Some(&guest_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
