//! Date ranges for stays and availability windows.
//!
//! Both ranges are half-open: the start date is included, the end date is not.
//! For a stay this means `check_out` is the departure day and is never charged.

use crate::error::BookingError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Longest bookable stay.
pub const MAX_STAY_NIGHTS: i64 = 30;

/// Longest window accepted by availability CRUD.
pub const MAX_AVAILABILITY_WINDOW_DAYS: i64 = 366;

/// A validated `[check_in, check_out)` stay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    /// Build a stay.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidDateRange`] if `check_out <= check_in`
    /// - [`BookingError::StayTooLong`] if the stay exceeds [`MAX_STAY_NIGHTS`]
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        if check_out <= check_in {
            return Err(BookingError::InvalidDateRange);
        }

        let nights = (check_out - check_in).num_days();
        if nights > MAX_STAY_NIGHTS {
            return Err(BookingError::StayTooLong {
                nights,
                max: MAX_STAY_NIGHTS,
            });
        }

        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Reject stays that start before `today`. Same-day check-in is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::CheckInInPast`] when `check_in < today`.
    pub fn validate_bookable(&self, today: NaiveDate) -> Result<(), BookingError> {
        if self.check_in < today {
            return Err(BookingError::CheckInInPast {
                check_in: self.check_in,
            });
        }
        Ok(())
    }

    /// First night.
    #[must_use]
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Departure day.
    #[must_use]
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of chargeable nights.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // bounded by MAX_STAY_NIGHTS
    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days() as u32
    }

    /// Every chargeable night in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.check_in
            .iter_days()
            .take_while(move |d| *d < self.check_out)
    }

    /// Whether two stays share at least one night.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Whether `date` is one of the chargeable nights.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}

/// A validated `[start, end)` window for availability CRUD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Build a window.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidDateRange`] if `end <= start`
    /// - [`BookingError::WindowTooLong`] if longer than [`MAX_AVAILABILITY_WINDOW_DAYS`]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BookingError> {
        if end <= start {
            return Err(BookingError::InvalidDateRange);
        }

        let days = (end - start).num_days();
        if days > MAX_AVAILABILITY_WINDOW_DAYS {
            return Err(BookingError::WindowTooLong {
                days,
                max: MAX_AVAILABILITY_WINDOW_DAYS,
            });
        }

        Ok(Self { start, end })
    }

    /// First date.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end date.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every date in the window.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d < self.end)
    }

    /// Whether `date` lies inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl From<StayRange> for DateWindow {
    fn from(stay: StayRange) -> Self {
        Self {
            start: stay.check_in,
            end: stay.check_out,
        }
    }
}
