//! Redis-backed session store.
//!
//! Sessions live under `session:{token}` as bincode-serialized
//! [`Session`] values with a TTL, so Redis expires them on its own.

use async_trait::async_trait;
use hotel_booking_core::error::AuthError;
use hotel_booking_core::providers::{HealthCheck, Session, SessionStore};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Redis [`SessionStore`].
///
/// Clones share the underlying `ConnectionManager`.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn_manager: ConnectionManager,
}

impl RedisSessionStore {
    /// Create a store over an existing connection manager.
    #[must_use]
    pub const fn new(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }

    fn session_key(token: &str) -> String {
        format!("session:{token}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, session: &Session, ttl: Duration) -> Result<(), AuthError> {
        let mut conn = self.conn_manager.clone();
        let bytes = bincode::serialize(session)
            .map_err(|e| AuthError::Internal(format!("session encoding failed: {e}")))?;
        let ttl_seconds = ttl.as_secs().max(1);

        let _: () = conn
            .set_ex(Self::session_key(&session.token), bytes, ttl_seconds)
            .await
            .map_err(|e| AuthError::Internal(format!("failed to store session: {e}")))?;

        tracing::info!(user_id = %session.user_id, ttl_seconds, "Created session");
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Session, AuthError> {
        let mut conn = self.conn_manager.clone();
        let bytes: Option<Vec<u8>> = conn
            .get(Self::session_key(token))
            .await
            .map_err(|e| AuthError::Internal(format!("failed to read session: {e}")))?;

        match bytes {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| AuthError::Internal(format!("session decoding failed: {e}"))),
            None => Err(AuthError::SessionNotFound),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), AuthError> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn
            .del(Self::session_key(token))
            .await
            .map_err(|e| AuthError::Internal(format!("failed to delete session: {e}")))?;
        Ok(())
    }
}

/// Readiness probe sending `PING`.
#[derive(Clone)]
pub struct RedisHealth {
    conn_manager: ConnectionManager,
}

impl RedisHealth {
    /// Create a probe over `conn_manager`.
    #[must_use]
    pub const fn new(conn_manager: ConnectionManager) -> Self {
        Self { conn_manager }
    }
}

#[async_trait]
impl HealthCheck for RedisHealth {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check(&self) -> Result<(), String> {
        let mut conn = self.conn_manager.clone();
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| e.to_string())?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(format!("unexpected PING reply: {reply}"))
        }
    }
}
