//! Shared harness: the real router over in-memory backends.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Duration;
use hotel_booking::realtime::LocalPublisher;
use hotel_booking::{AppState, Repositories, build_router};
use hotel_booking_core::providers::{RealtimeEvent, Session, SessionStore, UserRepository};
use hotel_booking_core::types::{Role, User};
use hotel_booking_core::{Clock, NaiveDate};
use hotel_booking_testing::fixtures::{date, new_user};
use hotel_booking_testing::{FixedClock, InMemoryBackend, InMemorySearchIndex, InMemorySessionStore};
use hotel_booking_web::TopicBroadcaster;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// "Today" in every HTTP test.
pub fn today() -> NaiveDate {
    date(2026, 6, 1)
}

/// First night opened by tests that book.
pub fn first_night() -> NaiveDate {
    date(2026, 7, 1)
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: InMemoryBackend,
    pub sessions: InMemorySessionStore,
    pub search: InMemorySearchIndex,
    pub broadcaster: TopicBroadcaster<RealtimeEvent>,
    pub clock: FixedClock,
}

impl TestApp {
    pub fn new() -> Self {
        let backend = InMemoryBackend::new();
        let sessions = InMemorySessionStore::new();
        let search = InMemorySearchIndex::new();
        let broadcaster = TopicBroadcaster::new();
        let clock = FixedClock::at_date(today());

        let repos = Repositories {
            users: Arc::new(backend.users.clone()),
            hotels: Arc::new(backend.hotels.clone()),
            rooms: Arc::new(backend.rooms.clone()),
            bookings: Arc::new(backend.bookings.clone()),
            reviews: Arc::new(backend.reviews.clone()),
            chat: Arc::new(backend.chat.clone()),
            notifications: Arc::new(backend.notifications.clone()),
        };
        let state = AppState::new(
            repos,
            Arc::new(sessions.clone()),
            Arc::new(search.clone()),
            Arc::new(LocalPublisher::new(broadcaster.clone())),
            broadcaster.clone(),
            Arc::new(clock.clone()),
        );
        let router = build_router(state.clone(), &[]);

        Self {
            router,
            state,
            backend,
            sessions,
            search,
            broadcaster,
            clock,
        }
    }

    /// Create a user and a session for it without going through Argon2.
    pub async fn sign_in(&self, email: &str, role: Role) -> (User, String) {
        let user = self.backend.users.create(&new_user(email, role)).await.unwrap();
        let token = format!("token-{}", user.id);
        let now = self.clock.now();
        let session = Session {
            token: token.clone(),
            user_id: user.id,
            role,
            email: user.email.clone(),
            created_at: now,
            expires_at: now + Duration::days(90),
        };
        self.sessions
            .create(&session, std::time::Duration::from_secs(90 * 86_400))
            .await
            .unwrap();
        (user, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Owner with one hotel and one room opened for 14 nights from [`first_night`].
    /// Returns `(owner_token, hotel_id, room_id)`.
    pub async fn seed_hotel(&self, total_units: u32) -> (String, String, String) {
        let (_, owner) = self.sign_in("owner@example.com", Role::HotelOwner).await;

        let (status, hotel) = self
            .post(
                "/api/hotels",
                Some(&owner),
                serde_json::json!({
                    "name": "Casa Azul",
                    "description": "Tiled townhouse by the river",
                    "address": "Rua Azul 1",
                    "city": "Lisbon",
                    "country": "Portugal",
                    "latitude": 38.7223,
                    "longitude": -9.1393,
                    "star_rating": 4,
                    "amenities": ["wifi", "breakfast"]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{hotel}");
        let hotel_id = hotel["id"].as_str().unwrap().to_string();

        let (status, room) = self
            .post(
                &format!("/api/hotels/{hotel_id}/rooms"),
                Some(&owner),
                serde_json::json!({
                    "name": "Double",
                    "room_type": "double",
                    "max_guests": 2,
                    "base_price": 10_000,
                    "total_units": total_units
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{room}");
        let room_id = room["id"].as_str().unwrap().to_string();

        let (status, written) = self
            .request(
                Method::PUT,
                &format!("/api/rooms/{room_id}/availability"),
                Some(&owner),
                Some(serde_json::json!({
                    "start": first_night(),
                    "end": first_night() + Duration::days(14),
                    "price_cents": 12_000,
                    "units": total_units
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{written}");
        assert_eq!(written["rows"], 14);

        (owner, hotel_id, room_id)
    }
}
