use super::SharedDb;
use async_trait::async_trait;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::providers::ChatRepository;
use hotel_booking_core::types::{ChatMessage, ChatRoom, ChatRoomId, HotelId, MessageId, UserId};
use hotel_booking_core::{DateTime, Utc};

/// In-memory [`ChatRepository`]. One room per participant pair.
#[derive(Clone)]
pub struct InMemoryChatStore {
    db: SharedDb,
}

impl InMemoryChatStore {
    /// Create a store over `db`.
    #[must_use]
    pub const fn new(db: SharedDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatStore {
    async fn get_or_create_room(
        &self,
        a: UserId,
        b: UserId,
        hotel_id: Option<HotelId>,
    ) -> StoreResult<ChatRoom> {
        if a == b {
            return Err(StoreError::Invalid("cannot open a chat with yourself".to_string()));
        }
        let (first, second) = ChatRoom::canonical_pair(a, b);

        let mut db = self.db.write().unwrap();
        if let Some(room) = db
            .chat_rooms
            .values_mut()
            .find(|r| r.participant_a == first && r.participant_b == second)
        {
            if room.hotel_id.is_none() {
                room.hotel_id = hotel_id;
            }
            return Ok(room.clone());
        }

        let room = ChatRoom {
            id: ChatRoomId::new(),
            participant_a: first,
            participant_b: second,
            hotel_id,
            created_at: Utc::now(),
            last_message_at: None,
        };
        db.chat_rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn get_room(&self, id: ChatRoomId) -> StoreResult<ChatRoom> {
        let db = self.db.read().unwrap();
        db.chat_rooms
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("chat room", id))
    }

    async fn list_rooms(&self, user_id: UserId) -> StoreResult<Vec<ChatRoom>> {
        let db = self.db.read().unwrap();
        let mut rooms: Vec<ChatRoom> = db
            .chat_rooms
            .values()
            .filter(|r| r.has_participant(user_id))
            .cloned()
            .collect();
        // newest activity first, rooms without messages last
        rooms.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(rooms)
    }

    async fn add_message(
        &self,
        room_id: ChatRoomId,
        sender_id: UserId,
        content: &str,
    ) -> StoreResult<ChatMessage> {
        let mut db = self.db.write().unwrap();
        let room = db
            .chat_rooms
            .get_mut(&room_id)
            .ok_or_else(|| StoreError::not_found("chat room", room_id))?;
        if !room.has_participant(sender_id) {
            return Err(StoreError::Forbidden("not a participant of this chat".to_string()));
        }

        let message = ChatMessage {
            id: MessageId::new(),
            room_id,
            sender_id,
            content: content.to_string(),
            created_at: Utc::now(),
            read_at: None,
        };
        room.last_message_at = Some(message.created_at);
        db.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        room_id: ChatRoomId,
        before: Option<DateTime<Utc>>,
        limit: u32,
    ) -> StoreResult<Vec<ChatMessage>> {
        let db = self.db.read().unwrap();
        let matching: Vec<&ChatMessage> = db
            .messages
            .iter()
            .filter(|m| m.room_id == room_id && before.is_none_or(|cutoff| m.created_at < cutoff))
            .collect();

        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let skip = matching.len().saturating_sub(limit);
        Ok(matching.into_iter().skip(skip).cloned().collect())
    }

    async fn mark_read(&self, room_id: ChatRoomId, reader_id: UserId) -> StoreResult<u64> {
        let mut db = self.db.write().unwrap();
        let now = Utc::now();
        let mut updated = 0;
        for message in &mut db.messages {
            if message.room_id == room_id && message.sender_id != reader_id && message.read_at.is_none() {
                message.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }
}
