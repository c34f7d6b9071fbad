//! Session store trait.

use crate::error::AuthError;
use crate::types::{Role, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An authenticated session, addressed by an opaque bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    /// Session owner
    pub user_id: UserId,
    /// Role at login time
    pub role: Role,
    /// Email at login time
    pub email: String,
    /// Login timestamp
    pub created_at: DateTime<Utc>,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Session store.
///
/// This trait abstracts over session storage (Redis).
///
/// # Implementation Notes
///
/// - Sessions are ephemeral (TTL from `AUTH_SESSION_TTL`)
/// - Expiry is enforced both by the store TTL and by [`Session::expires_at`]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the store is unreachable.
    async fn create(&self, session: &Session, ttl: Duration) -> Result<(), AuthError>;

    /// Get session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionNotFound`] if the token is unknown
    /// - [`AuthError::Internal`] if the store is unreachable
    async fn get(&self, token: &str) -> Result<Session, AuthError>;

    /// Delete session. Deleting an unknown token is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the store is unreachable.
    async fn delete(&self, token: &str) -> Result<(), AuthError>;
}
