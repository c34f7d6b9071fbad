//! `PostgreSQL` review repository.

use crate::error::{db_error, to_i64};
use crate::rows::{BOOKING_COLUMNS, BookingRow, ReviewRow, convert_all};
use async_trait::async_trait;
use chrono::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::providers::ReviewRepository;
use hotel_booking_core::status;
use hotel_booking_core::types::{Booking, HotelId, NewReview, Review, ReviewId};
use sqlx::PgPool;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, hotel_id, booking_id, author_id, rating, comment, created_at";

/// `PostgreSQL` review repository.
#[derive(Clone)]
pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn create(&self, review: &NewReview) -> StoreResult<Review> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR SHARE");
        let booking: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(review.booking_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("load booking"))?;
        let booking = Booking::try_from(
            booking.ok_or_else(|| StoreError::not_found("booking", review.booking_id))?,
        )?;
        status::check_review_eligibility(review, &booking)?;

        let sql = format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row: ReviewRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(review.hotel_id.as_uuid())
            .bind(review.booking_id.as_uuid())
            .bind(review.author_id.as_uuid())
            .bind(i16::from(review.rating))
            .bind(&review.comment)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match db_error("create review")(e) {
                StoreError::Conflict(_) => StoreError::Conflict("booking already has a review".to_string()),
                other => other,
            })?;

        tx.commit().await.map_err(db_error("commit review"))?;
        row.try_into()
    }

    async fn list_by_hotel(&self, hotel_id: HotelId, page: Page) -> StoreResult<Paginated<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE hotel_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows: Vec<ReviewRow> = sqlx::query_as(&sql)
            .bind(hotel_id.as_uuid())
            .bind(to_i64(page.limit(), "page_size")?)
            .bind(to_i64(page.offset(), "page")?)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list reviews"))?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE hotel_id = $1")
            .bind(hotel_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count reviews"))?;

        Ok(Paginated::new(
            convert_all(rows)?,
            u64::try_from(total).unwrap_or_default(),
            page,
        ))
    }

    async fn get(&self, id: ReviewId) -> StoreResult<Review> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let row: Option<ReviewRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load review"))?;

        row.ok_or_else(|| StoreError::not_found("review", id))?.try_into()
    }

    async fn delete(&self, id: ReviewId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete review"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("review", id));
        }
        Ok(())
    }
}
