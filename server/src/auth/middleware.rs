//! Authentication extractors.
//!
//! ```rust,ignore
//! async fn my_bookings(user: SessionUser, State(state): State<AppState>) -> WebResult<...> {
//!     // user.user_id comes from a live, unexpired session
//! }
//!
//! async fn create_hotel(user: SessionUser, ...) -> WebResult<...> {
//!     user.require_role(&[Role::HotelOwner, Role::Admin])?;
//! }
//! ```

use crate::server::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use hotel_booking_core::error::AuthError;
use hotel_booking_core::providers::Session;
use hotel_booking_core::types::{Actor, Role, UserId};
use hotel_booking_web::AppError;

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .trim();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// Authenticated session user.
///
/// Looks the bearer token up in the session store and rejects expired
/// sessions against the application clock.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The authenticated user ID
    pub user_id: UserId,
    /// Role at login time
    pub role: Role,
    /// The full session
    pub session: Session,
}

impl SessionUser {
    /// Authorization context for repository calls.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }

    /// Reject users whose role is not in `allowed`.
    ///
    /// # Errors
    ///
    /// Returns 403 Forbidden.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden.into())
        }
    }

    /// Resolve a raw session token.
    ///
    /// # Errors
    ///
    /// 401 for unknown or expired sessions, 500 if the store fails.
    pub async fn from_token(state: &AppState, token: &str) -> Result<Self, AppError> {
        let session = state.sessions.get(token).await?;
        if session.is_expired(state.clock.now()) {
            tracing::debug!(user_id = %session.user_id, "Rejected expired session");
            return Err(AuthError::SessionExpired.into());
        }

        Ok(Self {
            user_id: session.user_id,
            role: session.role,
            session,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let bearer = BearerToken::from_request_parts(parts, state).await?;
        Self::from_token(state, &bearer.0).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn bearer(header: Option<&str>) -> Result<BearerToken, AppError> {
        let mut builder = Request::builder();
        if let Some(value) = header {
            builder = builder.header(http::header::AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        BearerToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn bearer_token_parsing() {
        assert_eq!(bearer(Some("Bearer abc123")).await.unwrap().0, "abc123");

        for bad in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer   ")] {
            let err = bearer(bad).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn role_guard() {
        let now = chrono::Utc::now();
        let user = SessionUser {
            user_id: UserId::new(),
            role: Role::Customer,
            session: Session {
                token: "t".into(),
                user_id: UserId::new(),
                role: Role::Customer,
                email: "c@example.com".into(),
                created_at: now,
                expires_at: now,
            },
        };
        assert!(user.require_role(&[Role::Customer, Role::Admin]).is_ok());
        assert_eq!(
            user.require_role(&[Role::HotelOwner]).unwrap_err().status(),
            StatusCode::FORBIDDEN
        );
    }
}
