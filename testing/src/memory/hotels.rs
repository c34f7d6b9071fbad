use super::{InMemoryDb, SharedDb};
use async_trait::async_trait;
use hotel_booking_core::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::providers::HotelRepository;
use hotel_booking_core::types::{Hotel, HotelDraft, HotelFilter, HotelId, HotelSummary, UserId};

/// In-memory [`HotelRepository`]. Deleting a hotel cascades to its rooms,
/// ledger rows, bookings and reviews.
#[derive(Clone)]
pub struct InMemoryHotelStore {
    db: SharedDb,
}

impl InMemoryHotelStore {
    /// Create a store over `db`.
    #[must_use]
    pub const fn new(db: SharedDb) -> Self {
        Self { db }
    }
}

fn matches(hotel: &Hotel, filter: &HotelFilter) -> bool {
    filter
        .city
        .as_ref()
        .is_none_or(|city| hotel.city.eq_ignore_ascii_case(city))
        && filter
            .country
            .as_ref()
            .is_none_or(|country| hotel.country.eq_ignore_ascii_case(country))
        && filter.min_stars.is_none_or(|min| hotel.star_rating >= min)
        && filter.owner_id.is_none_or(|owner| hotel.owner_id == owner)
}

#[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
fn summarize(db: &InMemoryDb, hotel: &Hotel) -> HotelSummary {
    let ratings: Vec<u8> = db
        .reviews
        .values()
        .filter(|r| r.hotel_id == hotel.id)
        .map(|r| r.rating)
        .collect();
    let review_count = u32::try_from(ratings.len()).unwrap_or(u32::MAX);
    let average_rating = (!ratings.is_empty()).then(|| {
        ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64
    });

    HotelSummary {
        hotel: hotel.clone(),
        average_rating,
        review_count,
    }
}

fn newest_first(hotels: &mut [Hotel]) {
    hotels.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

fn apply_draft(hotel: &mut Hotel, draft: &HotelDraft) {
    hotel.name.clone_from(&draft.name);
    hotel.description.clone_from(&draft.description);
    hotel.address.clone_from(&draft.address);
    hotel.city.clone_from(&draft.city);
    hotel.country.clone_from(&draft.country);
    hotel.latitude = draft.latitude;
    hotel.longitude = draft.longitude;
    hotel.star_rating = draft.star_rating;
    hotel.amenities.clone_from(&draft.amenities);
}

#[async_trait]
impl HotelRepository for InMemoryHotelStore {
    async fn create(&self, owner_id: UserId, draft: &HotelDraft) -> StoreResult<Hotel> {
        let now = Utc::now();
        let mut hotel = Hotel {
            id: HotelId::new(),
            owner_id,
            name: String::new(),
            description: String::new(),
            address: String::new(),
            city: String::new(),
            country: String::new(),
            latitude: None,
            longitude: None,
            star_rating: 0,
            amenities: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        apply_draft(&mut hotel, draft);

        self.db.write().unwrap().hotels.insert(hotel.id, hotel.clone());
        Ok(hotel)
    }

    async fn get(&self, id: HotelId) -> StoreResult<Hotel> {
        let db = self.db.read().unwrap();
        db.hotels
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("hotel", id))
    }

    async fn get_summary(&self, id: HotelId) -> StoreResult<HotelSummary> {
        let db = self.db.read().unwrap();
        let hotel = db.hotels.get(&id).ok_or_else(|| StoreError::not_found("hotel", id))?;
        Ok(summarize(&db, hotel))
    }

    async fn list(&self, filter: &HotelFilter, page: Page) -> StoreResult<Paginated<HotelSummary>> {
        let db = self.db.read().unwrap();
        let mut hotels: Vec<Hotel> = db
            .hotels
            .values()
            .filter(|h| matches(h, filter))
            .cloned()
            .collect();
        newest_first(&mut hotels);

        let total = hotels.len() as u64;
        let items = page
            .slice(&hotels)
            .iter()
            .map(|h| summarize(&db, h))
            .collect();
        Ok(Paginated::new(items, total, page))
    }

    async fn update(&self, id: HotelId, draft: &HotelDraft) -> StoreResult<Hotel> {
        let mut db = self.db.write().unwrap();
        let hotel = db
            .hotels
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("hotel", id))?;
        apply_draft(hotel, draft);
        hotel.updated_at = Utc::now();
        Ok(hotel.clone())
    }

    async fn delete(&self, id: HotelId) -> StoreResult<()> {
        let mut db = self.db.write().unwrap();
        if db.hotels.remove(&id).is_none() {
            return Err(StoreError::not_found("hotel", id));
        }

        let rooms: Vec<_> = db
            .rooms
            .values()
            .filter(|r| r.hotel_id == id)
            .map(|r| r.id)
            .collect();
        for room in rooms {
            db.drop_room(room);
        }
        db.reviews.retain(|_, r| r.hotel_id != id);
        for chat in db.chat_rooms.values_mut() {
            if chat.hotel_id == Some(id) {
                chat.hotel_id = None;
            }
        }
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Hotel>> {
        let db = self.db.read().unwrap();
        let mut hotels: Vec<Hotel> = db
            .hotels
            .values()
            .filter(|h| h.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut hotels);
        Ok(hotels)
    }

    async fn all(&self) -> StoreResult<Vec<Hotel>> {
        let db = self.db.read().unwrap();
        let mut hotels: Vec<Hotel> = db.hotels.values().cloned().collect();
        hotels.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(hotels)
    }
}
