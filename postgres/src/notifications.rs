//! `PostgreSQL` notification repository.

use crate::error::{db_error, to_i64};
use crate::rows::{NotificationRow, convert_all};
use async_trait::async_trait;
use chrono::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::providers::{NewNotification, NotificationRepository};
use hotel_booking_core::types::{Notification, NotificationId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str = "id, user_id, kind, title, body, reference_id, read, created_at";

/// `PostgreSQL` notification repository.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> StoreResult<Notification> {
        let sql = format!(
            "INSERT INTO notifications ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7) \
             RETURNING {COLUMNS}"
        );
        let row: NotificationRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(notification.user_id.as_uuid())
            .bind(notification.kind.as_str())
            .bind(&notification.title)
            .bind(&notification.body)
            .bind(notification.reference_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("create notification"))?;

        row.try_into()
    }

    async fn list(&self, user_id: UserId, unread_only: bool, page: Page) -> StoreResult<Paginated<Notification>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT read) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let rows: Vec<NotificationRow> = sqlx::query_as(&sql)
            .bind(user_id.as_uuid())
            .bind(unread_only)
            .bind(to_i64(page.limit(), "page_size")?)
            .bind(to_i64(page.offset(), "page")?)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list notifications"))?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT read)")
                .bind(user_id.as_uuid())
                .bind(unread_only)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("count notifications"))?;

        Ok(Paginated::new(
            convert_all(rows)?,
            u64::try_from(total).unwrap_or_default(),
            page,
        ))
    }

    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> StoreResult<Notification> {
        let sql = format!(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        let row: Option<NotificationRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("mark notification read"))?;

        row.ok_or_else(|| StoreError::not_found("notification", id))?
            .try_into()
    }

    async fn mark_all_read(&self, user_id: UserId) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND NOT read")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("mark all notifications read"))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: NotificationId, user_id: UserId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete notification"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("notification", id));
        }
        Ok(())
    }

    async fn unread_count(&self, user_id: UserId) -> StoreResult<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT read")
                .bind(user_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("count unread notifications"))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
