//! HTTP error type.
//!
//! Every handler returns `Result<_, AppError>`. Domain and provider errors from
//! `hotel-booking-core` convert into it with `?`, which keeps the status-code
//! mapping in one place.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hotel_booking_core::error::{AuthError, BookingError, PublishError, SearchError, StoreError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Application error returned by handlers.
///
/// The client sees `{code, message}` (plus optional `details`). The `source`
/// is only logged.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    details: Option<Value>,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create an error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            details: None,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach structured details to the response body.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{resource} with id {id} not found"),
        )
    }

    /// 409 Conflict.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    /// 422 Unprocessable Entity.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message,
        )
    }

    /// 503 Service Unavailable.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::RoomUnavailable { dates } => {
                Self::new(StatusCode::CONFLICT, "ROOM_UNAVAILABLE", message)
                    .with_details(serde_json::json!({ "dates": dates }))
            }
            BookingError::InvalidStatusTransition { .. } => {
                Self::new(StatusCode::CONFLICT, "INVALID_STATUS_TRANSITION", message)
            }
            BookingError::StayNotFinished => {
                Self::new(StatusCode::CONFLICT, "STAY_NOT_FINISHED", message)
            }
            BookingError::CancellationWindowClosed => {
                Self::new(StatusCode::CONFLICT, "CANCELLATION_WINDOW_CLOSED", message)
            }
            BookingError::RoomNotFound | BookingError::BookingNotFound => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }
            BookingError::Forbidden => Self::forbidden(message),
            _ => Self::validation(message),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::not_found(entity, id),
            StoreError::Conflict(message) => Self::conflict(message),
            StoreError::Forbidden(message) => Self::forbidden(message),
            StoreError::Invalid(message) => Self::validation(message),
            StoreError::Domain(domain) => domain.into(),
            StoreError::Database(message) => {
                Self::internal("A database error occurred").with_source(anyhow::anyhow!(message))
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message)
            }
            AuthError::SessionNotFound | AuthError::SessionExpired => {
                Self::unauthorized(message)
            }
            AuthError::EmailTaken => Self::conflict(message),
            AuthError::Validation(message) => Self::validation(message),
            AuthError::Forbidden => Self::forbidden(message),
            AuthError::Internal(detail) => {
                Self::internal("An internal error occurred").with_source(anyhow::anyhow!(detail))
            }
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        Self::unavailable("Search is temporarily unavailable").with_source(err)
    }
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        Self::internal("Failed to deliver realtime event").with_source(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use hotel_booking_core::NaiveDate;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn display_includes_code() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn not_found_message() {
        let err = AppError::not_found("hotel", "123");
        assert_eq!(err.message(), "hotel with id 123 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unavailable_room_lists_dates() {
        let night = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let err: AppError = StoreError::Domain(BookingError::RoomUnavailable {
            dates: vec![night],
        })
        .into();

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ROOM_UNAVAILABLE");
        assert_eq!(body["details"]["dates"][0], "2026-03-14");
    }

    #[test]
    fn booking_validation_is_unprocessable() {
        let err: AppError = BookingError::InvalidDateRange.into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err: AppError = BookingError::CheckInInPast {
            check_in: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::not_found("room", "x"), StatusCode::NOT_FOUND),
            (StoreError::Conflict("dup".into()), StatusCode::CONFLICT),
            (StoreError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (StoreError::Invalid("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                StoreError::Database("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn database_detail_is_not_leaked() {
        let err: AppError = StoreError::Database("relation \"users\" does not exist".into()).into();
        let (_, body) = body_json(err).await;
        assert_eq!(body["message"], "A database error occurred");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn auth_errors() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).code(),
            "INVALID_CREDENTIALS"
        );
        assert_eq!(
            AppError::from(AuthError::SessionExpired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::EmailTaken).status(),
            StatusCode::CONFLICT
        );
    }
}
