//! `PostgreSQL` user repository.

use crate::error::db_error;
use crate::rows::{USER_COLUMNS, UserRow};
use async_trait::async_trait;
use chrono::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::providers::{NewUser, UserRepository};
use hotel_booking_core::types::{User, UserId};
use sqlx::PgPool;
use uuid::Uuid;

/// `PostgreSQL` user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, email, full_name, role, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(user.role.as_str())
            .bind(&user.password_hash)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("create user"))?;

        let user = User::try_from(row)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find user by email"))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find user"))?;

        row.ok_or_else(|| StoreError::not_found("user", id))?.try_into()
    }
}
