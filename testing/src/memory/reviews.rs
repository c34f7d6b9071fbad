use super::SharedDb;
use async_trait::async_trait;
use hotel_booking_core::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::providers::ReviewRepository;
use hotel_booking_core::status;
use hotel_booking_core::types::{HotelId, NewReview, Review, ReviewId};

/// In-memory [`ReviewRepository`]. One review per booking.
#[derive(Clone)]
pub struct InMemoryReviewStore {
    db: SharedDb,
}

impl InMemoryReviewStore {
    /// Create a store over `db`.
    #[must_use]
    pub const fn new(db: SharedDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewStore {
    async fn create(&self, new: &NewReview) -> StoreResult<Review> {
        let mut db = self.db.write().unwrap();
        let booking = db
            .bookings
            .get(&new.booking_id)
            .ok_or_else(|| StoreError::not_found("booking", new.booking_id))?;
        status::check_review_eligibility(new, booking)?;

        if db.reviews.values().any(|r| r.booking_id == new.booking_id) {
            return Err(StoreError::Conflict("booking already has a review".to_string()));
        }

        let review = Review {
            id: ReviewId::new(),
            hotel_id: new.hotel_id,
            booking_id: new.booking_id,
            author_id: new.author_id,
            rating: new.rating,
            comment: new.comment.clone(),
            created_at: Utc::now(),
        };
        db.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn list_by_hotel(&self, hotel_id: HotelId, page: Page) -> StoreResult<Paginated<Review>> {
        let db = self.db.read().unwrap();
        let mut reviews: Vec<Review> = db
            .reviews
            .values()
            .filter(|r| r.hotel_id == hotel_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = reviews.len() as u64;
        Ok(Paginated::new(page.slice(&reviews), total, page))
    }

    async fn get(&self, id: ReviewId) -> StoreResult<Review> {
        let db = self.db.read().unwrap();
        db.reviews
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("review", id))
    }

    async fn delete(&self, id: ReviewId) -> StoreResult<()> {
        let mut db = self.db.write().unwrap();
        db.reviews
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("review", id))
    }
}
