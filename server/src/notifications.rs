//! Persist-then-push notifications.

use crate::metrics;
use hotel_booking_core::error::StoreResult;
use hotel_booking_core::providers::{
    NewNotification, NotificationRepository, RealtimeEvent, RealtimePublisher, user_topic,
};
use hotel_booking_core::types::{Notification, NotificationKind, UserId};
use std::sync::Arc;
use uuid::Uuid;

/// Stores a notification and pushes it to `user:{id}`.
///
/// The push is best-effort: a broker failure is logged and the stored
/// notification is still returned.
#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn RealtimePublisher>,
}

impl NotificationService {
    /// Create a service over `repo` and `publisher`.
    #[must_use]
    pub fn new(repo: Arc<dyn NotificationRepository>, publisher: Arc<dyn RealtimePublisher>) -> Self {
        Self { repo, publisher }
    }

    /// Persist and push one notification.
    ///
    /// # Errors
    ///
    /// Returns the repository error if the notification cannot be stored.
    #[tracing::instrument(skip(self, title, body), fields(kind = kind.as_str()))]
    pub async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String> + Send,
        body: impl Into<String> + Send,
        reference_id: Option<Uuid>,
    ) -> StoreResult<Notification> {
        let notification = self
            .repo
            .create(&NewNotification {
                user_id,
                kind,
                title: title.into(),
                body: body.into(),
                reference_id,
            })
            .await?;
        metrics::record_notification(kind);

        let event = RealtimeEvent::Notification {
            notification: notification.clone(),
        };
        if let Err(e) = self.publisher.publish(&user_topic(user_id), &event).await {
            tracing::warn!(error = %e, notification_id = %notification.id, "Failed to push notification");
        }

        Ok(notification)
    }

    /// [`notify`](Self::notify) for side effects of another operation: a
    /// storage failure is logged instead of returned.
    pub async fn notify_quietly(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        title: impl Into<String> + Send,
        body: impl Into<String> + Send,
        reference_id: Option<Uuid>,
    ) {
        if let Err(e) = self.notify(user_id, kind, title, body, reference_id).await {
            tracing::warn!(error = %e, %user_id, "Failed to store notification");
        }
    }
}
