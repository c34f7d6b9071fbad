//! Account and session flows through the real router.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::TestApp;
use hotel_booking_core::types::Role;
use serde_json::json;

#[tokio::test]
async fn register_login_me_logout() {
    let app = TestApp::new();

    let (status, user) = app
        .post(
            "/api/auth/register",
            None,
            json!({"email": " Ana@Example.com ", "password": "correct horse", "full_name": "Ana", "role": "hotel_owner"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    assert_eq!(user["email"], "ana@example.com");
    assert_eq!(user["role"], "hotel_owner");
    assert!(user.get("password_hash").is_none());

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"email": "ana@example.com", "password": "another pass", "full_name": "Ana 2"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = app
        .post("/api/auth/login", None, json!({"email": "ana@example.com", "password": "wrong horse"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, login) = app
        .post("/api/auth/login", None, json!({"email": "ANA@example.com", "password": "correct horse"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{login}");
    let token = login["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 48);
    assert_eq!(login["user"]["id"], user["id"]);
    assert_eq!(app.sessions.len(), 1);

    let (status, me) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["full_name"], "Ana");

    let (status, _) = app.post("/api/auth/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.sessions.is_empty());

    let (status, _) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_validation() {
    let app = TestApp::new();

    let cases = [
        (json!({"email": "no-at-sign", "password": "long enough", "full_name": "X"}), StatusCode::UNPROCESSABLE_ENTITY),
        (json!({"email": "x@example.com", "password": "short", "full_name": "X"}), StatusCode::UNPROCESSABLE_ENTITY),
        (json!({"email": "x@example.com", "password": "long enough", "full_name": "  "}), StatusCode::UNPROCESSABLE_ENTITY),
        (json!({"email": "x@example.com", "password": "long enough", "full_name": "X", "role": "admin"}), StatusCode::FORBIDDEN),
    ];
    for (body, expected) in cases {
        let (status, response) = app.post("/api/auth/register", None, body).await;
        assert_eq!(status, expected, "{response}");
    }
}

#[tokio::test]
async fn bearer_token_is_required() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/bookings/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.get("/api/bookings/me", Some("not-a-session")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
    let app = TestApp::new();
    let (_, token) = app.sign_in("late@example.com", Role::Customer).await;

    let (status, _) = app.get("/api/bookings/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::days(91));
    let (status, _) = app.get("/api/bookings/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_guard_endpoints() {
    let app = TestApp::new();
    let (_, customer) = app.sign_in("guest@example.com", Role::Customer).await;

    let (status, _) = app
        .post(
            "/api/hotels",
            Some(&customer),
            json!({"name": "Nope", "address": "x", "city": "Porto", "country": "Portugal", "star_rating": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post("/api/admin/search/reindex", Some(&customer), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
