//! In-memory session store.

#![allow(clippy::unwrap_used)] // test infrastructure

use async_trait::async_trait;
use hotel_booking_core::error::AuthError;
use hotel_booking_core::providers::{Session, SessionStore};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// [`SessionStore`] backed by a `HashMap`.
///
/// The TTL is ignored; expiry is decided by [`Session::expires_at`] against
/// the caller's clock, which keeps tests deterministic.
#[derive(Clone, Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// Whether no session is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().unwrap().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: &Session, _ttl: Duration) -> Result<(), AuthError> {
        self.sessions
            .write()
            .unwrap()
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Session, AuthError> {
        self.sessions
            .read()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(AuthError::SessionNotFound)
    }

    async fn delete(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.write().unwrap().remove(token);
        Ok(())
    }
}
