//! Probe and metrics endpoints.
//!
//! ```bash
//! curl http://localhost:8080/health   # liveness, no dependencies touched
//! curl http://localhost:8080/ready    # pings PostgreSQL, Redis, Elasticsearch
//! curl http://localhost:8080/metrics  # Prometheus text format
//! ```

use super::state::AppState;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use hotel_booking_web::handlers::{ReadinessResponse, readiness};

/// Readiness over every configured dependency.
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    readiness(&state.health_checks).await
}

/// Prometheus scrape endpoint. 404 when no recorder is installed.
#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
