//! Deterministic clocks.

#![allow(clippy::unwrap_used)] // test infrastructure

use hotel_booking_core::{Clock, DateTime, NaiveDate, Utc};
use std::sync::{Arc, RwLock};

/// Clock that returns the same instant until moved.
///
/// Clones share the instant, so a test can hand one clone to the application
/// and move time with the other.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use hotel_booking_core::Clock;
/// use hotel_booking_testing::FixedClock;
///
/// let clock = FixedClock::new(Utc::now());
/// let first = clock.now();
/// assert_eq!(first, clock.now());
///
/// clock.advance(Duration::days(3));
/// assert_eq!(clock.now() - first, Duration::days(3));
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a clock frozen at `time`.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(RwLock::new(time)),
        }
    }

    /// Clock frozen at midnight UTC of `date`.
    #[must_use]
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Jump to `time`.
    pub fn set(&self, time: DateTime<Utc>) {
        *self.time.write().unwrap() = time;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: chrono::Duration) {
        let mut time = self.time.write().unwrap();
        *time += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.read().unwrap()
    }
}

/// Default fixed clock for tests (2025-01-01 00:00:00 UTC).
///
/// # Panics
///
/// Never in practice; the timestamp is a literal.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = test_clock();
        let handle = clock.clone();
        handle.advance(chrono::Duration::days(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }
}
