use super::SharedDb;
use async_trait::async_trait;
use hotel_booking_core::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::ledger::{self, AvailabilityQuote};
use hotel_booking_core::providers::{RoomAvailability, RoomRepository};
use hotel_booking_core::stay::{DateWindow, StayRange};
use hotel_booking_core::status;
use hotel_booking_core::types::{AvailabilityRow, HotelId, Room, RoomDraft, RoomId};

/// In-memory [`RoomRepository`] and availability ledger.
#[derive(Clone)]
pub struct InMemoryRoomStore {
    db: SharedDb,
}

impl InMemoryRoomStore {
    /// Create a store over `db`.
    #[must_use]
    pub const fn new(db: SharedDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomStore {
    async fn create(&self, hotel_id: HotelId, draft: &RoomDraft) -> StoreResult<Room> {
        let mut db = self.db.write().unwrap();
        if !db.hotels.contains_key(&hotel_id) {
            return Err(StoreError::not_found("hotel", hotel_id));
        }

        let now = Utc::now();
        let room = Room {
            id: RoomId::new(),
            hotel_id,
            name: draft.name.clone(),
            room_type: draft.room_type.clone(),
            description: draft.description.clone(),
            max_guests: draft.max_guests,
            base_price: draft.base_price,
            total_units: draft.total_units,
            created_at: now,
            updated_at: now,
        };
        db.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn get(&self, id: RoomId) -> StoreResult<Room> {
        self.db.read().unwrap().room(id).cloned()
    }

    async fn list_by_hotel(&self, hotel_id: HotelId) -> StoreResult<Vec<Room>> {
        let db = self.db.read().unwrap();
        let mut rooms: Vec<Room> = db
            .rooms
            .values()
            .filter(|r| r.hotel_id == hotel_id)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rooms)
    }

    async fn update(&self, id: RoomId, draft: &RoomDraft) -> StoreResult<Room> {
        let mut db = self.db.write().unwrap();
        let room = db
            .rooms
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("room", id))?;
        room.name.clone_from(&draft.name);
        room.room_type.clone_from(&draft.room_type);
        room.description.clone_from(&draft.description);
        room.max_guests = draft.max_guests;
        room.base_price = draft.base_price;
        room.total_units = draft.total_units;
        room.updated_at = Utc::now();
        let room = room.clone();

        for ((room_id, _), row) in &mut db.availability {
            if *room_id == id {
                row.available_units = row.available_units.min(room.total_units);
            }
        }
        Ok(room)
    }

    async fn delete(&self, id: RoomId) -> StoreResult<()> {
        let mut db = self.db.write().unwrap();
        db.room(id)?;

        let active = db
            .bookings
            .values()
            .filter(|b| b.room_id == id && status::holds_inventory(b.status))
            .count();
        if active > 0 {
            return Err(StoreError::Conflict(format!(
                "room has {active} active booking(s)"
            )));
        }

        db.drop_room(id);
        Ok(())
    }

    async fn upsert_availability(&self, room_id: RoomId, rows: &[AvailabilityRow]) -> StoreResult<u64> {
        let mut db = self.db.write().unwrap();
        db.room(room_id)?;

        let held = ledger::held_units(db.bookings.values(), room_id);
        for row in ledger::net_of_held(rows, &held) {
            db.availability.insert((room_id, row.date), AvailabilityRow { room_id, ..row });
        }
        Ok(rows.len() as u64)
    }

    async fn list_availability(
        &self,
        room_id: RoomId,
        window: &DateWindow,
    ) -> StoreResult<Vec<AvailabilityRow>> {
        Ok(self.db.read().unwrap().rows_in(room_id, window))
    }

    async fn delete_availability(&self, room_id: RoomId, window: &DateWindow) -> StoreResult<u64> {
        let mut db = self.db.write().unwrap();
        let before = db.availability.len();
        db.availability
            .retain(|(room, date), _| *room != room_id || !window.contains(*date));
        Ok((before - db.availability.len()) as u64)
    }

    async fn quote(&self, room_id: RoomId, stay: &StayRange, units: u32) -> StoreResult<AvailabilityQuote> {
        let db = self.db.read().unwrap();
        db.room(room_id)?;
        let rows = db.rows_in(room_id, &DateWindow::from(*stay));
        Ok(ledger::quote(&rows, stay, units))
    }

    async fn available_rooms(
        &self,
        hotel_id: HotelId,
        stay: &StayRange,
        units: u32,
    ) -> StoreResult<Vec<RoomAvailability>> {
        let rooms = self.list_by_hotel(hotel_id).await?;
        let db = self.db.read().unwrap();
        let window = DateWindow::from(*stay);

        Ok(rooms
            .into_iter()
            .filter_map(|room| {
                let quote = ledger::quote(&db.rows_in(room.id, &window), stay, units);
                quote.available.then_some(RoomAvailability { room, quote })
            })
            .collect())
    }
}
