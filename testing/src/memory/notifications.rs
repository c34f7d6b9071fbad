use super::SharedDb;
use async_trait::async_trait;
use hotel_booking_core::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::providers::{NewNotification, NotificationRepository};
use hotel_booking_core::types::{Notification, NotificationId, UserId};

/// In-memory [`NotificationRepository`]. Lists are newest first.
#[derive(Clone)]
pub struct InMemoryNotificationStore {
    db: SharedDb,
}

impl InMemoryNotificationStore {
    /// Create a store over `db`.
    #[must_use]
    pub const fn new(db: SharedDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationStore {
    async fn create(&self, new: &NewNotification) -> StoreResult<Notification> {
        let notification = Notification {
            id: NotificationId::new(),
            user_id: new.user_id,
            kind: new.kind,
            title: new.title.clone(),
            body: new.body.clone(),
            reference_id: new.reference_id,
            read: false,
            created_at: Utc::now(),
        };
        self.db.write().unwrap().notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list(
        &self,
        user_id: UserId,
        unread_only: bool,
        page: Page,
    ) -> StoreResult<Paginated<Notification>> {
        let db = self.db.read().unwrap();
        let matching: Vec<Notification> = db
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .cloned()
            .collect();

        let total = matching.len() as u64;
        Ok(Paginated::new(page.slice(&matching), total, page))
    }

    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> StoreResult<Notification> {
        let mut db = self.db.write().unwrap();
        let notification = db
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or_else(|| StoreError::not_found("notification", id))?;
        notification.read = true;
        Ok(notification.clone())
    }

    async fn mark_all_read(&self, user_id: UserId) -> StoreResult<u64> {
        let mut db = self.db.write().unwrap();
        let mut updated = 0;
        for notification in db.notifications.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, id: NotificationId, user_id: UserId) -> StoreResult<()> {
        let mut db = self.db.write().unwrap();
        let before = db.notifications.len();
        db.notifications.retain(|n| !(n.id == id && n.user_id == user_id));
        if db.notifications.len() == before {
            return Err(StoreError::not_found("notification", id));
        }
        Ok(())
    }

    async fn unread_count(&self, user_id: UserId) -> StoreResult<u64> {
        let db = self.db.read().unwrap();
        Ok(db
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as u64)
    }
}
