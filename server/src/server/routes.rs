//! Router configuration.

use super::health::{metrics, readiness_check};
use super::state::AppState;
use crate::api::{
    admin, availability, bookings, chat, hotels, notifications, reviews, rooms, search, websocket,
};
use crate::auth::handlers as auth;
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use hotel_booking_web::handlers::health_check;
use hotel_booking_web::track_correlation_id;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS policy: any origin when `origins` is empty, otherwise that list.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Build the complete Axum router.
///
/// - `/health`, `/ready`, `/metrics`
/// - `/api/...` resources
/// - `/ws` realtime gateway
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let api_routes = Router::new()
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Hotels
        .route("/hotels", get(hotels::list_hotels).post(hotels::create_hotel))
        .route("/hotels/search", get(search::search_hotels))
        .route(
            "/hotels/:id",
            get(hotels::get_hotel)
                .put(hotels::update_hotel)
                .delete(hotels::delete_hotel),
        )
        .route("/hotels/:id/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/hotels/:id/available-rooms", get(availability::available_rooms))
        .route("/hotels/:id/bookings", get(bookings::hotel_bookings))
        .route(
            "/hotels/:id/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        // Rooms and the ledger
        .route(
            "/rooms/:id",
            get(rooms::get_room).put(rooms::update_room).delete(rooms::delete_room),
        )
        .route(
            "/rooms/:id/availability",
            get(availability::list_availability)
                .put(availability::upsert_availability)
                .delete(availability::delete_availability),
        )
        .route("/rooms/:id/quote", get(availability::quote))
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/me", get(bookings::my_bookings))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        .route(
            "/bookings/:id/status",
            patch(bookings::update_booking_status),
        )
        .route("/reviews/:id", delete(reviews::delete_review))
        // Chat
        .route("/chat/rooms", get(chat::list_rooms).post(chat::open_room))
        .route(
            "/chat/rooms/:id/messages",
            get(chat::list_messages).post(chat::post_message),
        )
        .route("/chat/rooms/:id/read", post(chat::mark_read))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route(
            "/notifications/:id",
            delete(notifications::delete_notification),
        )
        // Admin
        .route("/admin/search/reindex", post(admin::reindex_search));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route("/ws", get(websocket::connect))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .layer(middleware::from_fn(track_correlation_id))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_origins_are_skipped() {
        // Must not panic on a header-invalid origin.
        let _layer = cors_layer(&["https://ok.example".to_string(), "bad\norigin".to_string()]);
    }
}
