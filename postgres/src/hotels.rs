//! `PostgreSQL` hotel repository.

use crate::error::{db_error, to_i64};
use crate::rows::{HOTEL_COLUMNS, HotelRow, HotelSummaryRow, convert_all};
use async_trait::async_trait;
use chrono::Utc;
use hotel_booking_core::error::{StoreError, StoreResult};
use hotel_booking_core::pagination::{Page, Paginated};
use hotel_booking_core::providers::HotelRepository;
use hotel_booking_core::types::{Hotel, HotelDraft, HotelFilter, HotelId, HotelSummary, UserId};
use sqlx::PgPool;
use uuid::Uuid;

/// Filter clause shared by the list and count queries. Binds `$1..=$4`.
const FILTER_CLAUSE: &str = "($1::text IS NULL OR lower(h.city) = lower($1)) \
     AND ($2::text IS NULL OR lower(h.country) = lower($2)) \
     AND ($3::smallint IS NULL OR h.star_rating >= $3) \
     AND ($4::uuid IS NULL OR h.owner_id = $4)";

/// `PostgreSQL` hotel repository.
#[derive(Clone)]
pub struct PostgresHotelRepository {
    pool: PgPool,
}

impl PostgresHotelRepository {
    /// Create a new repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn summary_select() -> String {
        format!(
            "SELECT {HOTEL_COLUMNS}, AVG(r.rating)::float8 AS average_rating, COUNT(r.id) AS review_count \
             FROM hotels h LEFT JOIN reviews r ON r.hotel_id = h.id"
        )
    }
}

#[async_trait]
impl HotelRepository for PostgresHotelRepository {
    async fn create(&self, owner_id: UserId, draft: &HotelDraft) -> StoreResult<Hotel> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO hotels AS h (id, owner_id, name, description, address, city, country, \
                 latitude, longitude, star_rating, amenities, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
             RETURNING {HOTEL_COLUMNS}"
        );
        let row: HotelRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(owner_id.as_uuid())
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(&draft.address)
            .bind(&draft.city)
            .bind(&draft.country)
            .bind(draft.latitude)
            .bind(draft.longitude)
            .bind(i16::from(draft.star_rating))
            .bind(&draft.amenities)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("create hotel"))?;

        let hotel = Hotel::try_from(row)?;
        tracing::info!(hotel_id = %hotel.id, owner_id = %owner_id, "Hotel created");
        Ok(hotel)
    }

    async fn get(&self, id: HotelId) -> StoreResult<Hotel> {
        let sql = format!("SELECT {HOTEL_COLUMNS} FROM hotels h WHERE h.id = $1");
        let row: Option<HotelRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load hotel"))?;

        row.ok_or_else(|| StoreError::not_found("hotel", id))?.try_into()
    }

    async fn get_summary(&self, id: HotelId) -> StoreResult<HotelSummary> {
        let sql = format!("{} WHERE h.id = $1 GROUP BY h.id", Self::summary_select());
        let row: Option<HotelSummaryRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load hotel summary"))?;

        row.ok_or_else(|| StoreError::not_found("hotel", id))?.try_into()
    }

    async fn list(&self, filter: &HotelFilter, page: Page) -> StoreResult<Paginated<HotelSummary>> {
        let min_stars = filter.min_stars.map(i16::from);
        let owner = filter.owner_id.map(|id| *id.as_uuid());

        let sql = format!(
            "{} WHERE {FILTER_CLAUSE} GROUP BY h.id ORDER BY h.created_at DESC LIMIT $5 OFFSET $6",
            Self::summary_select()
        );
        let rows: Vec<HotelSummaryRow> = sqlx::query_as(&sql)
            .bind(filter.city.as_deref())
            .bind(filter.country.as_deref())
            .bind(min_stars)
            .bind(owner)
            .bind(to_i64(page.limit(), "page_size")?)
            .bind(to_i64(page.offset(), "page")?)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list hotels"))?;

        let count_sql = format!("SELECT COUNT(*) FROM hotels h WHERE {FILTER_CLAUSE}");
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(filter.city.as_deref())
            .bind(filter.country.as_deref())
            .bind(min_stars)
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count hotels"))?;

        Ok(Paginated::new(
            convert_all(rows)?,
            u64::try_from(total).unwrap_or_default(),
            page,
        ))
    }

    async fn update(&self, id: HotelId, draft: &HotelDraft) -> StoreResult<Hotel> {
        let sql = format!(
            "UPDATE hotels h SET name = $2, description = $3, address = $4, city = $5, country = $6, \
                 latitude = $7, longitude = $8, star_rating = $9, amenities = $10, updated_at = $11 \
             WHERE h.id = $1 RETURNING {HOTEL_COLUMNS}"
        );
        let row: Option<HotelRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(&draft.address)
            .bind(&draft.city)
            .bind(&draft.country)
            .bind(draft.latitude)
            .bind(draft.longitude)
            .bind(i16::from(draft.star_rating))
            .bind(&draft.amenities)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("update hotel"))?;

        row.ok_or_else(|| StoreError::not_found("hotel", id))?.try_into()
    }

    async fn delete(&self, id: HotelId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM hotels WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete hotel"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("hotel", id));
        }

        tracing::info!(hotel_id = %id, "Hotel deleted");
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Hotel>> {
        let sql = format!("SELECT {HOTEL_COLUMNS} FROM hotels h WHERE h.owner_id = $1 ORDER BY h.created_at DESC");
        let rows: Vec<HotelRow> = sqlx::query_as(&sql)
            .bind(owner_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list owner hotels"))?;

        convert_all(rows)
    }

    async fn all(&self) -> StoreResult<Vec<Hotel>> {
        let sql = format!("SELECT {HOTEL_COLUMNS} FROM hotels h ORDER BY h.created_at");
        let rows: Vec<HotelRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list all hotels"))?;

        convert_all(rows)
    }
}
