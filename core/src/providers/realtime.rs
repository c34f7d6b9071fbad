//! Realtime fan-out.

use crate::error::PublishError;
use crate::types::{ChatMessage, ChatRoomId, Notification, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Event pushed to WebSocket subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// A chat message was persisted
    ChatMessage {
        /// The message
        message: ChatMessage,
    },
    /// A notification was created
    Notification {
        /// The notification
        notification: Notification,
    },
}

/// Topic carrying messages of one chat room.
#[must_use]
pub fn chat_topic(room_id: ChatRoomId) -> String {
    format!("chat:{room_id}")
}

/// Topic carrying a user's private events.
#[must_use]
pub fn user_topic(user_id: UserId) -> String {
    format!("user:{user_id}")
}

/// Publishes realtime events to every node.
#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Publish `event` on `topic`.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Encode`] if the event cannot be serialized
    /// - [`PublishError::Broker`] if the broker rejects the publish
    async fn publish(&self, topic: &str, event: &RealtimeEvent) -> Result<(), PublishError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{MessageId, UserId};
    use chrono::Utc;

    #[test]
    fn topics_embed_ids() {
        let room = ChatRoomId::new();
        let user = UserId::new();
        assert_eq!(chat_topic(room), format!("chat:{room}"));
        assert_eq!(user_topic(user), format!("user:{user}"));
    }

    #[test]
    fn events_are_tagged() {
        let event = RealtimeEvent::ChatMessage {
            message: ChatMessage {
                id: MessageId::new(),
                room_id: ChatRoomId::new(),
                sender_id: UserId::new(),
                content: "hi".to_string(),
                created_at: Utc::now(),
                read_at: None,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "chat_message");
        assert_eq!(json["message"]["content"], "hi");

        let back: RealtimeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
