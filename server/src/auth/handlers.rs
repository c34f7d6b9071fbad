//! Account endpoints.
//!
//! - `POST /api/auth/register` - create a customer or hotel-owner account
//! - `POST /api/auth/login` - exchange credentials for a session token
//! - `POST /api/auth/logout` - revoke the current session
//! - `GET /api/auth/me` - the current user

use crate::auth::middleware::SessionUser;
use crate::auth::password;
use crate::server::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use hotel_booking_core::error::{AuthError, StoreError};
use hotel_booking_core::providers::{NewUser, Session};
use hotel_booking_core::types::{Role, User};
use hotel_booking_web::{AppError, ClientIp, CorrelationId, UserAgent, WebResult};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Length of generated session tokens.
const TOKEN_LENGTH: usize = 48;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Display name
    pub full_name: String,
    /// Requested role (defaults to customer)
    #[serde(default = "default_role")]
    pub role: Role,
}

const fn default_role() -> Role {
    Role::Customer
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// Absolute expiry of the session
    pub expires_at: DateTime<Utc>,
    /// The logged in user
    pub user: User,
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Register a new account.
///
/// Admin accounts cannot be self-registered.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/auth/register \
///   -H "Content-Type: application/json" \
///   -d '{"email":"ana@example.com","password":"correct horse","full_name":"Ana","role":"hotel_owner"}'
/// ```
///
/// # Errors
///
/// - 422 for an invalid email, short password or empty name
/// - 403 for `role = admin`
/// - 409 if the email is already registered
pub async fn register(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Json(request): Json<RegisterRequest>,
) -> WebResult<(StatusCode, Json<User>)> {
    let email = password::normalize_email(&request.email)?;
    password::validate_password(&request.password)?;
    let full_name = request.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AuthError::Validation("full_name must not be empty".to_string()).into());
    }
    if request.role == Role::Admin {
        return Err(AuthError::Forbidden.into());
    }

    let password_hash = password::hash_password(request.password).await?;
    let user = state
        .repos
        .users
        .create(&NewUser {
            email,
            full_name,
            role: request.role,
            password_hash,
        })
        .await
        .map_err(|err| match err {
            StoreError::Conflict(_) => AppError::from(AuthError::EmailTaken),
            other => other.into(),
        })?;

    tracing::info!(
        user_id = %user.id,
        role = %user.role,
        correlation_id = %correlation_id.0,
        "User registered"
    );

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
///
/// # Errors
///
/// - 401 `INVALID_CREDENTIALS` for an unknown email or wrong password
/// - 500 if the session store is unreachable
pub async fn login(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    ClientIp(ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<LoginResponse>> {
    // Malformed emails cannot belong to an account.
    let email = password::normalize_email(&request.email).map_err(|_| AuthError::InvalidCredentials)?;

    let Some(user) = state.repos.users.find_by_email(&email).await? else {
        tracing::info!(ip = %ip, correlation_id = %correlation_id.0, "Login for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !password::verify_password(request.password, user.password_hash.clone()).await? {
        tracing::info!(user_id = %user.id, ip = %ip, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let now = state.clock.now();
    let ttl = state.session_ttl;
    let expires_at = now
        + chrono::Duration::from_std(ttl)
            .map_err(|e| AuthError::Internal(format!("session ttl out of range: {e}")))?;

    let session = Session {
        token: generate_token(),
        user_id: user.id,
        role: user.role,
        email: user.email.clone(),
        created_at: now,
        expires_at,
    };
    state.sessions.create(&session, ttl).await?;

    tracing::info!(
        user_id = %user.id,
        ip = %ip,
        user_agent = %user_agent,
        correlation_id = %correlation_id.0,
        "User logged in"
    );

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at,
        user,
    }))
}

/// Revoke the current session.
///
/// # Errors
///
/// 401 without a valid session.
pub async fn logout(user: SessionUser, State(state): State<AppState>) -> WebResult<StatusCode> {
    state.sessions.delete(&user.session.token).await?;
    tracing::info!(user_id = %user.user_id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// The current user.
///
/// # Errors
///
/// 401 without a valid session, 404 if the account was removed.
pub async fn me(user: SessionUser, State(state): State<AppState>) -> WebResult<Json<User>> {
    let user = state.repos.users.find_by_id(user.user_id).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_alphanumeric_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
