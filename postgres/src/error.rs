//! Mapping from `sqlx` failures to [`StoreError`].

use hotel_booking_core::error::{StoreError, StoreResult};

/// Build a mapper that tags an `sqlx::Error` with what was being attempted.
///
/// Unique violations become [`StoreError::Conflict`], foreign-key violations
/// become [`StoreError::Invalid`], everything else is a database error.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(format!("{context}: already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::Invalid(format!("{context}: referenced entity does not exist"));
            }
        }
        tracing::error!(error = %e, context, "database operation failed");
        StoreError::Database(format!("{context}: {e}"))
    }
}

/// `INTEGER` column to `u32`.
pub(crate) fn to_u32(value: i32, column: &'static str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Database(format!("negative value in column {column}")))
}

/// `BIGINT` column to `u64`.
pub(crate) fn to_u64(value: i64, column: &'static str) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::Database(format!("negative value in column {column}")))
}

/// `u32` to an `INTEGER` bind parameter.
pub(crate) fn to_i32(value: u32, field: &'static str) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::Invalid(format!("{field} is too large")))
}

/// `u64` to a `BIGINT` bind parameter.
pub(crate) fn to_i64(value: u64, field: &'static str) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::Invalid(format!("{field} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_conversions_reject_out_of_range() {
        assert_eq!(to_u32(3, "units"), Ok(3));
        assert!(to_u32(-1, "units").is_err());
        assert!(to_i32(u32::MAX, "units").is_err());
        assert!(to_i64(u64::MAX, "price").is_err());
        assert_eq!(to_u64(10, "price"), Ok(10));
    }

    #[test]
    fn row_not_found_is_a_database_error() {
        let err = db_error("load hotel")(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(msg) if msg.starts_with("load hotel")));
    }
}
