//! Error types for the booking domain and its providers.

use crate::types::BookingStatus;
use chrono::NaiveDate;
use thiserror::Error;

/// Domain rule violations raised by the stay, ledger and status modules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// `check_out` is not after `check_in`.
    #[error("check-out date must be after check-in date")]
    InvalidDateRange,

    /// Stay exceeds the maximum number of nights.
    #[error("stay of {nights} nights exceeds the maximum of {max}")]
    StayTooLong {
        /// Requested nights
        nights: i64,
        /// Allowed nights
        max: i64,
    },

    /// Availability window exceeds the maximum length.
    #[error("availability window of {days} days exceeds the maximum of {max}")]
    WindowTooLong {
        /// Requested days
        days: i64,
        /// Allowed days
        max: i64,
    },

    /// Check-in lies before today.
    #[error("check-in date {check_in} is in the past")]
    CheckInInPast {
        /// Requested check-in
        check_in: NaiveDate,
    },

    /// Zero units requested.
    #[error("at least one unit must be requested")]
    InvalidUnits,

    /// Availability price of zero.
    #[error("nightly price must be greater than zero")]
    InvalidPrice,

    /// Availability units exceed the room's capacity.
    #[error("{units} units exceed the room total of {total}")]
    UnitsExceedRoomTotal {
        /// Requested units
        units: u32,
        /// Room total units
        total: u32,
    },

    /// Too many guests for the booked units.
    #[error("{guests} guests exceed the maximum of {max} for the booked units")]
    GuestsExceedCapacity {
        /// Requested guests
        guests: u32,
        /// Allowed guests
        max: u32,
    },

    /// One or more nights have no row or not enough units.
    #[error("room is unavailable on {} night(s)", dates.len())]
    RoomUnavailable {
        /// Every offending night, sorted
        dates: Vec<NaiveDate>,
    },

    /// Total price overflowed.
    #[error("total price overflow")]
    PriceOverflow,

    /// Status change not permitted by the state machine.
    #[error("cannot change booking status from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// Completion requested before the stay ended.
    #[error("stay has not finished yet")]
    StayNotFinished,

    /// Customer cancellation after check-in started.
    #[error("bookings can no longer be cancelled once check-in has started")]
    CancellationWindowClosed,

    /// Room does not exist.
    #[error("room not found")]
    RoomNotFound,

    /// Booking does not exist.
    #[error("booking not found")]
    BookingNotFound,

    /// Caller may not perform the operation.
    #[error("not allowed to perform this operation")]
    Forbidden,
}

impl BookingError {
    /// Returns `true` if this error is caused by caller input rather than state.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateRange
                | Self::StayTooLong { .. }
                | Self::WindowTooLong { .. }
                | Self::CheckInInPast { .. }
                | Self::InvalidUnits
                | Self::InvalidPrice
                | Self::UnitsExceedRoomTotal { .. }
                | Self::GuestsExceedCapacity { .. }
        )
    }
}

/// Failures surfaced by repository implementations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// Entity lookup failed.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity name
        entity: &'static str,
        /// Looked-up id
        id: String,
    },

    /// Uniqueness or state conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller may not touch this entity.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Input rejected by the store.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(String),

    /// Domain rule violation.
    #[error(transparent)]
    Domain(#[from] BookingError),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type alias for repository operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Authentication and session errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already registered.
    #[error("email is already registered")]
    EmailTaken,

    /// Registration payload rejected.
    #[error("{0}")]
    Validation(String),

    /// Session token unknown.
    #[error("session not found")]
    SessionNotFound,

    /// Session expired.
    #[error("session has expired")]
    SessionExpired,

    /// Role not permitted.
    #[error("insufficient permissions")]
    Forbidden,

    /// Backend failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Search index errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Transport failure.
    #[error("search request failed: {0}")]
    RequestFailed(String),

    /// Non-success HTTP status from the search backend.
    #[error("search backend returned {status}: {message}")]
    Backend {
        /// HTTP status
        status: u16,
        /// Response body
        message: String,
    },

    /// Response body could not be decoded.
    #[error("failed to parse search response: {0}")]
    ResponseParse(String),
}

/// Realtime publish errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Event could not be encoded.
    #[error("failed to encode event: {0}")]
    Encode(String),

    /// Broker rejected the publish.
    #[error("publish failed: {0}")]
    Broker(String),
}
