//! `PostgreSQL` chat repository.

use crate::error::db_error;
use crate::rows::{ChatMessageRow, ChatRoomRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::providers::ChatRepository;
use hotel_booking_core::types::{ChatMessage, ChatRoom, ChatRoomId, HotelId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

const ROOM_COLUMNS: &str = "id, participant_a, participant_b, hotel_id, created_at, last_message_at";
const MESSAGE_COLUMNS: &str = "id, room_id, sender_id, content, created_at, read_at";

/// `PostgreSQL` chat repository.
#[derive(Clone)]
pub struct PostgresChatRepository {
    pool: PgPool,
}

impl PostgresChatRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PostgresChatRepository {
    async fn get_or_create_room(&self, a: UserId, b: UserId, hotel_id: Option<HotelId>) -> StoreResult<ChatRoom> {
        if a == b {
            return Err(StoreError::Invalid("cannot open a chat with yourself".to_string()));
        }
        let (first, second) = ChatRoom::canonical_pair(a, b);

        let sql = format!(
            "INSERT INTO chat_rooms ({ROOM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, NULL) \
             ON CONFLICT (participant_a, participant_b) \
             DO UPDATE SET hotel_id = COALESCE(chat_rooms.hotel_id, EXCLUDED.hotel_id) \
             RETURNING {ROOM_COLUMNS}"
        );
        let row: ChatRoomRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(first.as_uuid())
            .bind(second.as_uuid())
            .bind(hotel_id.map(|id| *id.as_uuid()))
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("open chat room"))?;

        Ok(row.into())
    }

    async fn get_room(&self, id: ChatRoomId) -> StoreResult<ChatRoom> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE id = $1");
        let row: Option<ChatRoomRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load chat room"))?;

        row.map(Into::into)
            .ok_or_else(|| StoreError::not_found("chat room", id))
    }

    async fn list_rooms(&self, user_id: UserId) -> StoreResult<Vec<ChatRoom>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE participant_a = $1 OR participant_b = $1 \
             ORDER BY last_message_at DESC NULLS LAST, created_at DESC"
        );
        let rows: Vec<ChatRoomRow> = sqlx::query_as(&sql)
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list chat rooms"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_message(&self, room_id: ChatRoomId, sender_id: UserId, content: &str) -> StoreResult<ChatMessage> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let sql = format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE id = $1 FOR UPDATE");
        let room: ChatRoom = sqlx::query_as::<_, ChatRoomRow>(&sql)
            .bind(room_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("lock chat room"))?
            .map(Into::into)
            .ok_or_else(|| StoreError::not_found("chat room", room_id))?;

        if !room.has_participant(sender_id) {
            return Err(StoreError::Forbidden("not a participant of this chat".to_string()));
        }

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO chat_messages ({MESSAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, NULL) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        let row: ChatMessageRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(room_id.as_uuid())
            .bind(sender_id.as_uuid())
            .bind(content)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("insert chat message"))?;

        sqlx::query("UPDATE chat_rooms SET last_message_at = $2 WHERE id = $1")
            .bind(room_id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error("touch chat room"))?;

        tx.commit().await.map_err(db_error("commit chat message"))?;
        Ok(row.into())
    }

    async fn list_messages(
        &self,
        room_id: ChatRoomId,
        before: Option<DateTime<Utc>>,
        limit: u32,
    ) -> StoreResult<Vec<ChatMessage>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM ( \
                 SELECT {MESSAGE_COLUMNS} FROM chat_messages \
                 WHERE room_id = $1 AND ($2::timestamptz IS NULL OR created_at < $2) \
                 ORDER BY created_at DESC LIMIT $3 \
             ) page ORDER BY created_at ASC"
        );
        let rows: Vec<ChatMessageRow> = sqlx::query_as(&sql)
            .bind(room_id.as_uuid())
            .bind(before)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list chat messages"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_read(&self, room_id: ChatRoomId, reader_id: UserId) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE chat_messages SET read_at = $3 \
             WHERE room_id = $1 AND sender_id <> $2 AND read_at IS NULL",
        )
        .bind(room_id.as_uuid())
        .bind(reader_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_error("mark chat read"))?;

        Ok(result.rows_affected())
    }
}
