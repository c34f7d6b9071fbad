//! Liveness and readiness endpoints.

use axum::{Json, http::StatusCode};
use futures::future::join_all;
use hotel_booking_core::providers::HealthCheck;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// How long a single dependency may take to answer.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// `GET /health` body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Liveness: the process is up. Dependencies are not touched.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// State of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentStatus {
    /// Whether the ping succeeded
    pub healthy: bool,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /ready` body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// All components healthy
    pub ready: bool,
    /// Per-component detail, keyed by [`HealthCheck::name`]
    pub components: BTreeMap<&'static str, ComponentStatus>,
}

/// Ping every dependency concurrently.
///
/// Responds 200 when all are healthy and 503 otherwise.
pub async fn readiness(checks: &[Arc<dyn HealthCheck>]) -> (StatusCode, Json<ReadinessResponse>) {
    let results = join_all(checks.iter().map(|check| async move {
        let outcome = match tokio::time::timeout(CHECK_TIMEOUT, check.check()).await {
            Ok(result) => result,
            Err(_) => Err(format!("timed out after {}s", CHECK_TIMEOUT.as_secs())),
        };
        (check.name(), outcome)
    }))
    .await;

    let mut components = BTreeMap::new();
    for (name, outcome) in results {
        if let Err(reason) = &outcome {
            tracing::warn!(component = name, error = %reason, "Readiness check failed");
        }
        components.insert(
            name,
            ComponentStatus {
                healthy: outcome.is_ok(),
                error: outcome.err(),
            },
        );
    }

    let ready = components.values().all(|c| c.healthy);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, components }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(&'static str, Result<(), String>);

    #[async_trait]
    impl HealthCheck for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn check(&self) -> Result<(), String> {
            self.1.clone()
        }
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let (status, Json(body)) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn ready_when_all_healthy() {
        let checks: Vec<Arc<dyn HealthCheck>> = vec![
            Arc::new(Fixed("postgres", Ok(()))),
            Arc::new(Fixed("redis", Ok(()))),
        ];
        let (status, Json(body)) = readiness(&checks).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.ready);
        assert_eq!(body.components.len(), 2);
    }

    #[tokio::test]
    async fn one_failure_makes_service_unready() {
        let checks: Vec<Arc<dyn HealthCheck>> = vec![
            Arc::new(Fixed("postgres", Ok(()))),
            Arc::new(Fixed("elasticsearch", Err("connection refused".into()))),
        ];
        let (status, Json(body)) = readiness(&checks).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.ready);
        assert_eq!(
            body.components["elasticsearch"].error.as_deref(),
            Some("connection refused")
        );
    }
}
