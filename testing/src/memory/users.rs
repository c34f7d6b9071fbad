use super::SharedDb;
use async_trait::async_trait;
use hotel_booking_core::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::providers::{NewUser, UserRepository};
use hotel_booking_core::types::{User, UserId};

/// In-memory [`UserRepository`]. Emails are unique.
#[derive(Clone)]
pub struct InMemoryUserStore {
    db: SharedDb,
}

impl InMemoryUserStore {
    /// Create a store over `db`.
    #[must_use]
    pub const fn new(db: SharedDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn create(&self, new: &NewUser) -> StoreResult<User> {
        let mut db = self.db.write().unwrap();
        if db.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict(format!("email {} already exists", new.email)));
        }

        let user = User {
            id: UserId::new(),
            email: new.email.clone(),
            full_name: new.full_name.clone(),
            role: new.role,
            password_hash: new.password_hash.clone(),
            created_at: Utc::now(),
        };
        db.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let db = self.db.read().unwrap();
        Ok(db.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<User> {
        let db = self.db.read().unwrap();
        db.users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }
}
