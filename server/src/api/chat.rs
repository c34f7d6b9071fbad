//! Chat endpoints.
//!
//! Rooms are shared per participant pair. Sending a message persists it,
//! publishes it on `chat:{room}` and notifies the other participant. The
//! WebSocket gateway sends through the same path.

use crate::auth::SessionUser;
use crate::metrics;
use crate::server::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use hotel_booking_core::error::AuthError;
use hotel_booking_core::providers::{RealtimeEvent, chat_topic};
use hotel_booking_core::types::{ChatMessage, ChatRoom, ChatRoomId, HotelId, NotificationKind, UserId};
use hotel_booking_web::{AppError, WebResult};
use serde::{Deserialize, Serialize};

/// Default number of messages per page.
const DEFAULT_MESSAGE_LIMIT: u32 = 50;

/// Largest message page.
const MAX_MESSAGE_LIMIT: u32 = 100;

/// Characters of a message quoted in its notification.
const PREVIEW_CHARS: usize = 80;

/// Open or fetch the room with another user.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// The other participant
    pub participant_id: UserId,
    /// Hotel the conversation is about
    pub hotel_id: Option<HotelId>,
}

/// Message history query.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    /// Only messages older than this
    pub before: Option<DateTime<Utc>>,
    /// Page size (default 50, max 100)
    pub limit: Option<u32>,
}

/// Message body.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Text
    pub content: String,
}

/// Messages marked read.
#[derive(Debug, Serialize)]
pub struct MarkedRead {
    /// Number of messages updated
    pub updated: u64,
}

/// Load a room the user participates in.
pub(crate) async fn participant_room(state: &AppState, user_id: UserId, room_id: ChatRoomId) -> WebResult<ChatRoom> {
    let room = state.repos.chat.get_room(room_id).await?;
    if room.has_participant(user_id) {
        Ok(room)
    } else {
        Err(AuthError::Forbidden.into())
    }
}

/// Persist, publish and notify one message.
pub(crate) async fn send_message(
    state: &AppState,
    sender_id: UserId,
    room_id: ChatRoomId,
    content: &str,
) -> WebResult<ChatMessage> {
    ChatMessage::validate_content(content).map_err(AppError::validation)?;
    let room = participant_room(state, sender_id, room_id).await?;

    let message = state.repos.chat.add_message(room_id, sender_id, content).await?;
    metrics::record_chat_message();

    let event = RealtimeEvent::ChatMessage {
        message: message.clone(),
    };
    if let Err(error) = state.publisher.publish(&chat_topic(room_id), &event).await {
        tracing::warn!(room_id = %room_id, message_id = %message.id, %error, "Failed to publish chat message");
    }

    let preview: String = message.content.chars().take(PREVIEW_CHARS).collect();
    state
        .notifier
        .notify_quietly(
            room.other_participant(sender_id),
            NotificationKind::NewMessage,
            "New message",
            preview,
            Some(*room_id.as_uuid()),
        )
        .await;

    Ok(message)
}

/// Rooms of the caller, most recent activity first.
pub async fn list_rooms(user: SessionUser, State(state): State<AppState>) -> WebResult<Json<Vec<ChatRoom>>> {
    Ok(Json(state.repos.chat.list_rooms(user.user_id).await?))
}

/// Get or create the room between the caller and `participant_id`.
pub async fn open_room(
    user: SessionUser,
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> WebResult<Json<ChatRoom>> {
    state.repos.users.find_by_id(request.participant_id).await?;
    if let Some(hotel_id) = request.hotel_id {
        state.repos.hotels.get(hotel_id).await?;
    }

    let room = state
        .repos
        .chat
        .get_or_create_room(user.user_id, request.participant_id, request.hotel_id)
        .await?;
    Ok(Json(room))
}

/// Message history, oldest first.
pub async fn list_messages(
    user: SessionUser,
    State(state): State<AppState>,
    Path(room_id): Path<ChatRoomId>,
    Query(query): Query<MessagesQuery>,
) -> WebResult<Json<Vec<ChatMessage>>> {
    participant_room(&state, user.user_id, room_id).await?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_MESSAGE_LIMIT)
        .clamp(1, MAX_MESSAGE_LIMIT);
    Ok(Json(
        state.repos.chat.list_messages(room_id, query.before, limit).await?,
    ))
}

/// Send a message.
pub async fn post_message(
    user: SessionUser,
    State(state): State<AppState>,
    Path(room_id): Path<ChatRoomId>,
    Json(request): Json<SendMessageRequest>,
) -> WebResult<(StatusCode, Json<ChatMessage>)> {
    let message = send_message(&state, user.user_id, room_id, &request.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Mark the other participant's messages read.
pub async fn mark_read(
    user: SessionUser,
    State(state): State<AppState>,
    Path(room_id): Path<ChatRoomId>,
) -> WebResult<Json<MarkedRead>> {
    participant_room(&state, user.user_id, room_id).await?;
    let updated = state.repos.chat.mark_read(room_id, user.user_id).await?;
    Ok(Json(MarkedRead { updated }))
}
