//! Realtime gateway.
//!
//! # Protocol
//!
//! Connect with the session token as a query parameter (browsers cannot set
//! headers on WebSocket handshakes):
//!
//! ```text
//! ws://localhost:8080/ws?token=<session_token>
//! ```
//!
//! The connection is subscribed to `user:{id}` right away.
//!
//! **Client → Server:**
//! ```json
//! {"type": "join", "room_id": "..."}
//! {"type": "leave", "room_id": "..."}
//! {"type": "send", "room_id": "...", "content": "Is breakfast included?"}
//! {"type": "ping"}
//! ```
//!
//! **Server → Client:**
//! ```json
//! {"type": "joined", "room_id": "..."}
//! {"type": "left", "room_id": "..."}
//! {"type": "pong"}
//! {"type": "event", "topic": "chat:...", "event": {"kind": "chat_message", "message": {...}}}
//! {"type": "error", "message": "..."}
//! ```

use crate::api::chat::{participant_room, send_message};
use crate::auth::SessionUser;
use crate::server::AppState;
use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{Sink, SinkExt, StreamExt};
use hotel_booking_core::providers::{RealtimeEvent, chat_topic, user_topic};
use hotel_booking_core::types::ChatRoomId;
use hotel_booking_web::{AppError, Subscriptions};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Active WebSocket connections on this instance.
static ACTIVE_CONNECTIONS: AtomicUsize = AtomicUsize::new(0);

/// Maximum concurrent WebSocket connections.
const MAX_CONNECTIONS: usize = 10_000;

/// Events buffered per connection before forwarders wait on the socket.
const OUTBOUND_CAPACITY: usize = 64;

/// Handshake query.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Session token
    pub token: String,
}

/// Frame sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a chat room
    Join {
        /// Room
        room_id: ChatRoomId,
    },
    /// Unsubscribe from a chat room
    Leave {
        /// Room
        room_id: ChatRoomId,
    },
    /// Send a chat message
    Send {
        /// Room
        room_id: ChatRoomId,
        /// Text
        content: String,
    },
    /// Keep-alive
    Ping,
}

/// Frame sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Joined a chat room
    Joined {
        /// Room
        room_id: ChatRoomId,
    },
    /// Left a chat room
    Left {
        /// Room
        room_id: ChatRoomId,
    },
    /// Reply to `ping`
    Pong,
    /// Event on a subscribed topic
    Event {
        /// Topic the event arrived on
        topic: String,
        /// The event
        event: RealtimeEvent,
    },
    /// Request failed
    Error {
        /// Reason
        message: String,
    },
}

impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        Self::Error {
            message: err.message().to_string(),
        }
    }
}

/// Number of open WebSocket connections on this instance.
#[must_use]
pub fn active_connection_count() -> usize {
    ACTIVE_CONNECTIONS.load(Ordering::Relaxed)
}

/// `GET /ws?token=` upgrade.
///
/// # Errors
///
/// 401 before the upgrade for unknown or expired tokens, 503 when the
/// connection limit is reached.
pub async fn connect(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
) -> Result<Response, AppError> {
    let current = active_connection_count();
    if current >= MAX_CONNECTIONS {
        tracing::warn!(current_connections = current, "WebSocket connection limit exceeded");
        return Ok((StatusCode::SERVICE_UNAVAILABLE, "Too many concurrent connections").into_response());
    }

    let user = SessionUser::from_token(&state, &query.token).await?;
    tracing::info!(user_id = %user.user_id, "WebSocket connection requested");

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, user, state)))
}

/// Apply one client frame to the connection's subscriptions.
///
/// Returns the direct reply, if any. Chat messages sent here reach
/// subscribers through the publisher, including this connection when it has
/// joined the room.
pub async fn handle_frame(
    state: &AppState,
    user: &SessionUser,
    subscriptions: &mut Subscriptions<RealtimeEvent>,
    frame: &str,
) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ClientMessage>(frame) {
        Ok(message) => message,
        Err(e) => {
            return Some(ServerMessage::Error {
                message: format!("invalid message: {e}"),
            });
        }
    };

    match message {
        ClientMessage::Join { room_id } => match participant_room(state, user.user_id, room_id).await {
            Ok(_) => {
                subscriptions.join(&chat_topic(room_id)).await;
                Some(ServerMessage::Joined { room_id })
            }
            Err(err) => Some(err.into()),
        },
        ClientMessage::Leave { room_id } => {
            subscriptions.leave(&chat_topic(room_id));
            Some(ServerMessage::Left { room_id })
        }
        ClientMessage::Send { room_id, content } => {
            match send_message(state, user.user_id, room_id, &content).await {
                Ok(_) => None,
                Err(err) => Some(err.into()),
            }
        }
        ClientMessage::Ping => Some(ServerMessage::Pong),
    }
}

async fn send_json<S>(sink: &mut S, message: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(message) {
        Ok(json) => sink.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode WebSocket message");
            true
        }
    }
}

async fn handle_socket(socket: WebSocket, user: SessionUser, state: AppState) {
    let count = ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::info!(user_id = %user.user_id, total_connections = count, "WebSocket connection established");

    let (mut sink, mut stream) = socket.split();
    let (mut subscriptions, mut events) = Subscriptions::new(state.broadcaster.clone(), OUTBOUND_CAPACITY);
    subscriptions.join(&user_topic(user.user_id)).await;

    loop {
        tokio::select! {
            Some((topic, event)) = events.recv() => {
                if !send_json(&mut sink, &ServerMessage::Event { topic, event }).await {
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if user.session.is_expired(state.clock.now()) {
                        let expired = ServerMessage::Error { message: "Session expired".to_string() };
                        if !send_json(&mut sink, &expired).await {
                            tracing::debug!(user_id = %user.user_id, "Client gone before session expiry notice");
                        }
                        break;
                    }
                    if let Some(reply) = handle_frame(&state, &user, &mut subscriptions, &text).await {
                        if !send_json(&mut sink, &reply).await {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(user_id = %user.user_id, error = %e, "WebSocket receive failed");
                    break;
                }
            },
        }
    }

    drop(subscriptions);
    let remaining = ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    tracing::info!(user_id = %user.user_id, total_connections = remaining, "WebSocket connection closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_are_tagged() {
        let room_id = ChatRoomId::new();
        let frame = format!(r#"{{"type":"send","room_id":"{room_id}","content":"hi"}}"#);
        assert_eq!(
            serde_json::from_str::<ClientMessage>(&frame).unwrap(),
            ClientMessage::Send {
                room_id,
                content: "hi".to_string()
            }
        );
        assert_eq!(
            serde_json::from_str::<ClientMessage>(r#"{"type":"ping"}"#).unwrap(),
            ClientMessage::Ping
        );
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn server_frames_are_tagged() {
        let json = serde_json::to_value(ServerMessage::Pong).unwrap();
        assert_eq!(json, serde_json::json!({"type": "pong"}));

        let json = serde_json::to_value(ServerMessage::from(AppError::forbidden("no"))).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "no");
    }
}
