//! Per-night availability ledger.
//!
//! Pure planning functions shared by every storage backend. A backend loads
//! (and, for `PostgreSQL`, locks) the availability rows covering a stay, asks
//! this module for a plan, then writes the plan back inside the same
//! transaction. Nothing here performs I/O.
//!
//! ```text
//!   load rows FOR UPDATE ──► plan_reservation ──► UPDATE units, INSERT booking ──► COMMIT
//!                               │
//!                               └─► RoomUnavailable { dates } ──► ROLLBACK
//! ```

use crate::error::BookingError;
use crate::status;
use crate::stay::{DateWindow, StayRange};
use crate::types::{AvailabilityRow, Booking, Money, NewBooking, Room, RoomId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// New unit count for one night.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NightUpdate {
    /// Night
    pub date: NaiveDate,
    /// Units remaining after the operation
    pub available_units: u32,
}

/// Result of a successful reservation plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationPlan {
    /// One update per night of the stay, in date order
    pub updates: Vec<NightUpdate>,
    /// `units × Σ nightly price`
    pub total_price: Money,
}

/// Result of a release plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleasePlan {
    /// Updates for nights whose row still exists
    pub updates: Vec<NightUpdate>,
    /// Nights whose row was deleted after booking
    pub missing_dates: Vec<NaiveDate>,
}

/// Non-failing availability answer for a stay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuote {
    /// Whether every night can be booked
    pub available: bool,
    /// Nights that block the stay
    pub unavailable_dates: Vec<NaiveDate>,
    /// Total price when available
    pub total_price: Option<Money>,
    /// Number of nights in the stay
    pub nights: u32,
    /// Units the quote was computed for
    pub units: u32,
}

fn index_rows(rows: &[AvailabilityRow]) -> HashMap<NaiveDate, &AvailabilityRow> {
    rows.iter().map(|row| (row.date, row)).collect()
}

/// Every night of `stay` that has no row or fewer than `units` available.
#[must_use]
pub fn unavailable_dates(rows: &[AvailabilityRow], stay: &StayRange, units: u32) -> Vec<NaiveDate> {
    let by_date = index_rows(rows);
    let blocked: BTreeSet<NaiveDate> = stay
        .dates()
        .filter(|date| {
            by_date
                .get(date)
                .is_none_or(|row| row.available_units < units)
        })
        .collect();
    blocked.into_iter().collect()
}

fn total_for(rows: &HashMap<NaiveDate, &AvailabilityRow>, stay: &StayRange, units: u32) -> Result<Money, BookingError> {
    let mut per_unit = Money::ZERO;
    for date in stay.dates() {
        let price = rows.get(&date).map_or(Money::ZERO, |row| row.price);
        per_unit = per_unit
            .checked_add(price)
            .ok_or(BookingError::PriceOverflow)?;
    }
    per_unit
        .checked_multiply(units)
        .ok_or(BookingError::PriceOverflow)
}

/// Validate a booking request against its room before touching the ledger.
///
/// # Errors
///
/// - Stay errors from [`StayRange::new`] and [`StayRange::validate_bookable`]
/// - [`BookingError::InvalidUnits`] for zero units
/// - [`BookingError::UnitsExceedRoomTotal`] when asking for more units than the room has
/// - [`BookingError::GuestsExceedCapacity`] when `guests > max_guests × units`
pub fn check_request(request: &NewBooking, room: &Room, today: NaiveDate) -> Result<StayRange, BookingError> {
    let stay = StayRange::new(request.check_in, request.check_out)?;
    stay.validate_bookable(today)?;

    if request.units == 0 {
        return Err(BookingError::InvalidUnits);
    }
    if request.units > room.total_units {
        return Err(BookingError::UnitsExceedRoomTotal {
            units: request.units,
            total: room.total_units,
        });
    }

    let max = room.max_guests.saturating_mul(request.units);
    if request.guests > max {
        return Err(BookingError::GuestsExceedCapacity {
            guests: request.guests,
            max,
        });
    }

    Ok(stay)
}

/// Plan the decrement of `units` on every night of `stay`.
///
/// # Errors
///
/// - [`BookingError::InvalidUnits`] if `units == 0`
/// - [`BookingError::RoomUnavailable`] listing every night that is missing or short
/// - [`BookingError::PriceOverflow`] if the total does not fit in `u64` cents
pub fn plan_reservation(
    rows: &[AvailabilityRow],
    stay: &StayRange,
    units: u32,
) -> Result<ReservationPlan, BookingError> {
    if units == 0 {
        return Err(BookingError::InvalidUnits);
    }

    let dates = unavailable_dates(rows, stay, units);
    if !dates.is_empty() {
        return Err(BookingError::RoomUnavailable { dates });
    }

    let by_date = index_rows(rows);
    let total_price = total_for(&by_date, stay, units)?;

    let updates = stay
        .dates()
        .filter_map(|date| {
            by_date.get(&date).map(|row| NightUpdate {
                date,
                available_units: row.available_units - units,
            })
        })
        .collect();

    Ok(ReservationPlan {
        updates,
        total_price,
    })
}

/// Plan giving `units` back to every night of `stay`.
///
/// Nights without a row are reported in [`ReleasePlan::missing_dates`] and skipped.
#[must_use]
pub fn plan_release(rows: &[AvailabilityRow], stay: &StayRange, units: u32) -> ReleasePlan {
    let by_date = index_rows(rows);
    let mut updates = Vec::new();
    let mut missing_dates = Vec::new();

    for date in stay.dates() {
        match by_date.get(&date) {
            Some(row) => updates.push(NightUpdate {
                date,
                available_units: row.available_units.saturating_add(units),
            }),
            None => missing_dates.push(date),
        }
    }

    ReleasePlan {
        updates,
        missing_dates,
    }
}

impl ReleasePlan {
    /// Clamp every update to the room's `total_units`.
    #[must_use]
    pub fn capped(mut self, total_units: u32) -> Self {
        for update in &mut self.updates {
            update.available_units = update.available_units.min(total_units);
        }
        self
    }

    /// Whether every night of the stay still had a row.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_dates.is_empty()
    }
}

/// Answer "can `units` be booked for `stay`?" without failing.
#[must_use]
pub fn quote(rows: &[AvailabilityRow], stay: &StayRange, units: u32) -> AvailabilityQuote {
    let nights = stay.nights();
    if units == 0 {
        return AvailabilityQuote {
            available: false,
            unavailable_dates: Vec::new(),
            total_price: None,
            nights,
            units,
        };
    }

    let unavailable_dates = unavailable_dates(rows, stay, units);
    let available = unavailable_dates.is_empty();
    let total_price = if available {
        total_for(&index_rows(rows), stay, units).ok()
    } else {
        None
    };

    AvailabilityQuote {
        available,
        unavailable_dates,
        total_price,
        nights,
        units,
    }
}

/// Build the rows an owner opens for `window` on `room`.
///
/// # Errors
///
/// - [`BookingError::InvalidPrice`] if `price` is zero
/// - [`BookingError::UnitsExceedRoomTotal`] if `units > room.total_units`
pub fn expand_window(
    room: &Room,
    window: &DateWindow,
    price: Money,
    units: u32,
) -> Result<Vec<AvailabilityRow>, BookingError> {
    if price.is_zero() {
        return Err(BookingError::InvalidPrice);
    }
    if units > room.total_units {
        return Err(BookingError::UnitsExceedRoomTotal {
            units,
            total: room.total_units,
        });
    }

    Ok(window
        .dates()
        .map(|date| AvailabilityRow {
            room_id: room.id,
            date,
            price,
            available_units: units,
        })
        .collect())
}

/// Units held by active bookings of `room_id`, per night. Nights nobody holds
/// are absent.
#[must_use]
pub fn held_units<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    room_id: RoomId,
) -> HashMap<NaiveDate, u32> {
    let mut held: HashMap<NaiveDate, u32> = HashMap::new();
    for booking in bookings {
        if booking.room_id != room_id || !status::holds_inventory(booking.status) {
            continue;
        }
        for night in booking.check_in.iter_days().take_while(|d| *d < booking.check_out) {
            let units = held.entry(night).or_default();
            *units = units.saturating_add(booking.units);
        }
    }
    held
}

/// Turn the stock an owner opens per night into the units still for sale.
///
/// Units held on a night come off its row. A night whose stock is below what
/// is already held opens with zero units.
#[must_use]
pub fn net_of_held(rows: &[AvailabilityRow], held: &HashMap<NaiveDate, u32>) -> Vec<AvailabilityRow> {
    rows.iter()
        .map(|row| {
            let taken = held.get(&row.date).copied().unwrap_or(0);
            AvailabilityRow {
                available_units: row.available_units.saturating_sub(taken),
                ..*row
            }
        })
        .collect()
}

/// Rows of `rows` belonging to `room_id` inside `window`, sorted by date.
#[must_use]
pub fn rows_in_window(rows: &[AvailabilityRow], room_id: RoomId, window: &DateWindow) -> Vec<AvailabilityRow> {
    let mut selected: Vec<AvailabilityRow> = rows
        .iter()
        .filter(|row| row.room_id == room_id && window.contains(row.date))
        .copied()
        .collect();
    selected.sort_by_key(|row| row.date);
    selected
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn room(total_units: u32) -> Room {
        Room {
            id: RoomId::new(),
            hotel_id: crate::types::HotelId::new(),
            name: "Deluxe".to_string(),
            room_type: "double".to_string(),
            description: String::new(),
            max_guests: 2,
            base_price: Money::from_cents(10_000),
            total_units,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rows(room_id: RoomId, start: NaiveDate, prices: &[(u64, u32)]) -> Vec<AvailabilityRow> {
        prices
            .iter()
            .enumerate()
            .map(|(i, (price, units))| AvailabilityRow {
                room_id,
                date: start + Duration::days(i64::try_from(i).unwrap()),
                price: Money::from_cents(*price),
                available_units: *units,
            })
            .collect()
    }

    #[test]
    fn reservation_decrements_each_night_and_sums_prices() {
        let room_id = RoomId::new();
        let ledger = rows(room_id, date(2026, 7, 1), &[(10_000, 3), (12_000, 3), (15_000, 1)]);
        let stay = StayRange::new(date(2026, 7, 1), date(2026, 7, 3)).unwrap();

        let plan = plan_reservation(&ledger, &stay, 2).unwrap();

        assert_eq!(plan.total_price, Money::from_cents(44_000));
        assert_eq!(
            plan.updates,
            vec![
                NightUpdate { date: date(2026, 7, 1), available_units: 1 },
                NightUpdate { date: date(2026, 7, 2), available_units: 1 },
            ]
        );
    }

    #[test]
    fn reservation_reports_every_missing_and_short_night() {
        let room_id = RoomId::new();
        // 7/1 ok, 7/2 short, 7/3 missing, 7/4 short
        let mut ledger = rows(room_id, date(2026, 7, 1), &[(10_000, 2), (10_000, 1)]);
        ledger.extend(rows(room_id, date(2026, 7, 4), &[(10_000, 0)]));
        let stay = StayRange::new(date(2026, 7, 1), date(2026, 7, 5)).unwrap();

        let err = plan_reservation(&ledger, &stay, 2).unwrap_err();

        assert_eq!(
            err,
            BookingError::RoomUnavailable {
                dates: vec![date(2026, 7, 2), date(2026, 7, 3), date(2026, 7, 4)]
            }
        );
    }

    #[test]
    fn request_checks_guests_per_unit() {
        let room = room(3);
        let request = NewBooking {
            customer_id: crate::types::UserId::new(),
            room_id: room.id,
            check_in: date(2026, 7, 1),
            check_out: date(2026, 7, 4),
            units: 2,
            guests: 5,
            special_requests: None,
        };
        let today = date(2026, 6, 1);

        assert_eq!(
            check_request(&request, &room, today),
            Err(BookingError::GuestsExceedCapacity { guests: 5, max: 4 })
        );

        let fits = NewBooking { guests: 4, ..request.clone() };
        assert_eq!(check_request(&fits, &room, today).unwrap().nights(), 3);

        let too_many = NewBooking { units: 4, ..request.clone() };
        assert_eq!(
            check_request(&too_many, &room, today),
            Err(BookingError::UnitsExceedRoomTotal { units: 4, total: 3 })
        );

        assert!(matches!(
            check_request(&fits, &room, date(2026, 7, 2)),
            Err(BookingError::CheckInInPast { .. })
        ));
    }

    #[test]
    fn reservation_rejects_zero_units() {
        let stay = StayRange::new(date(2026, 7, 1), date(2026, 7, 2)).unwrap();
        assert_eq!(plan_reservation(&[], &stay, 0), Err(BookingError::InvalidUnits));
    }

    #[test]
    fn last_unit_can_be_taken_exactly_once() {
        let room_id = RoomId::new();
        let mut ledger = rows(room_id, date(2026, 8, 1), &[(9_000, 1)]);
        let stay = StayRange::new(date(2026, 8, 1), date(2026, 8, 2)).unwrap();

        let plan = plan_reservation(&ledger, &stay, 1).unwrap();
        ledger[0].available_units = plan.updates[0].available_units;

        assert!(matches!(
            plan_reservation(&ledger, &stay, 1),
            Err(BookingError::RoomUnavailable { .. })
        ));
    }

    #[test]
    fn price_overflow_is_an_error() {
        let room_id = RoomId::new();
        let ledger = rows(room_id, date(2026, 7, 1), &[(u64::MAX, 5)]);
        let stay = StayRange::new(date(2026, 7, 1), date(2026, 7, 2)).unwrap();
        assert_eq!(plan_reservation(&ledger, &stay, 2), Err(BookingError::PriceOverflow));
    }

    #[test]
    fn release_skips_deleted_nights() {
        let room_id = RoomId::new();
        let ledger = rows(room_id, date(2026, 7, 1), &[(10_000, 0)]);
        let stay = StayRange::new(date(2026, 7, 1), date(2026, 7, 3)).unwrap();

        let plan = plan_release(&ledger, &stay, 2);

        assert_eq!(plan.updates, vec![NightUpdate { date: date(2026, 7, 1), available_units: 2 }]);
        assert_eq!(plan.missing_dates, vec![date(2026, 7, 2)]);
        assert!(!plan.is_complete());
    }

    #[test]
    fn release_never_exceeds_room_total() {
        let room_id = RoomId::new();
        let ledger = rows(room_id, date(2026, 7, 1), &[(10_000, 3), (10_000, u32::MAX)]);
        let stay = StayRange::new(date(2026, 7, 1), date(2026, 7, 3)).unwrap();

        let plan = plan_release(&ledger, &stay, 2);
        assert_eq!(plan.updates[1].available_units, u32::MAX);

        let capped = plan.capped(4);
        assert_eq!(capped.updates[0].available_units, 4);
        assert_eq!(capped.updates[1].available_units, 4);
    }

    #[test]
    fn quote_reports_without_failing() {
        let room_id = RoomId::new();
        let ledger = rows(room_id, date(2026, 7, 1), &[(10_000, 1), (11_000, 1)]);
        let stay = StayRange::new(date(2026, 7, 1), date(2026, 7, 3)).unwrap();

        let ok = quote(&ledger, &stay, 1);
        assert!(ok.available);
        assert_eq!(ok.total_price, Some(Money::from_cents(21_000)));
        assert_eq!(ok.nights, 2);

        let short = quote(&ledger, &stay, 2);
        assert!(!short.available);
        assert_eq!(short.unavailable_dates.len(), 2);
        assert_eq!(short.total_price, None);
    }

    #[test]
    fn expand_window_validates_against_room() {
        let room = room(4);
        let window = DateWindow::new(date(2026, 9, 1), date(2026, 9, 4)).unwrap();

        let opened = expand_window(&room, &window, Money::from_cents(8_000), 4).unwrap();
        assert_eq!(opened.len(), 3);
        assert!(opened.iter().all(|row| row.available_units == 4 && row.room_id == room.id));

        assert_eq!(
            expand_window(&room, &window, Money::ZERO, 1),
            Err(BookingError::InvalidPrice)
        );
        assert_eq!(
            expand_window(&room, &window, Money::from_cents(1), 5),
            Err(BookingError::UnitsExceedRoomTotal { units: 5, total: 4 })
        );
    }

    fn booking(room_id: RoomId, check_in: NaiveDate, nights: i64, units: u32, status: crate::types::BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: crate::types::BookingId::new(),
            customer_id: crate::types::UserId::new(),
            hotel_id: crate::types::HotelId::new(),
            room_id,
            check_in,
            check_out: check_in + Duration::days(nights),
            units,
            guests: 1,
            total_price: Money::from_cents(1),
            status,
            special_requests: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        }
    }

    #[test]
    fn reopened_nights_keep_units_held_by_active_bookings() {
        use crate::types::BookingStatus;

        let room = room(2);
        let other = RoomId::new();
        let bookings = vec![
            booking(room.id, date(2026, 7, 1), 2, 1, BookingStatus::Confirmed),
            booking(room.id, date(2026, 7, 2), 1, 1, BookingStatus::Pending),
            booking(room.id, date(2026, 7, 1), 3, 2, BookingStatus::Cancelled),
            booking(other, date(2026, 7, 1), 3, 2, BookingStatus::Confirmed),
        ];

        let held = held_units(&bookings, room.id);
        assert_eq!(held.get(&date(2026, 7, 1)), Some(&1));
        assert_eq!(held.get(&date(2026, 7, 2)), Some(&2));
        assert_eq!(held.get(&date(2026, 7, 3)), None);

        let window = DateWindow::new(date(2026, 7, 1), date(2026, 7, 4)).unwrap();
        let opened = expand_window(&room, &window, Money::from_cents(12_000), 2).unwrap();
        let units: Vec<u32> = net_of_held(&opened, &held)
            .iter()
            .map(|row| row.available_units)
            .collect();
        assert_eq!(units, vec![1, 0, 2]);
    }

    #[test]
    fn rows_in_window_filters_room_and_dates() {
        let a = RoomId::new();
        let b = RoomId::new();
        let mut ledger = rows(a, date(2026, 1, 1), &[(1, 1), (1, 1), (1, 1)]);
        ledger.extend(rows(b, date(2026, 1, 1), &[(1, 1)]));
        ledger.reverse();
        let window = DateWindow::new(date(2026, 1, 2), date(2026, 1, 10)).unwrap();

        let selected = rows_in_window(&ledger, a, &window);
        assert_eq!(selected.len(), 2);
        assert!(selected[0].date < selected[1].date);
    }

    proptest! {
        #[test]
        fn reserve_then_release_restores_units(
            units in proptest::collection::vec(0u32..10, 1..15),
            requested in 1u32..5,
        ) {
            let room_id = RoomId::new();
            let start = date(2026, 3, 1);
            let ledger: Vec<AvailabilityRow> = units
                .iter()
                .enumerate()
                .map(|(i, u)| AvailabilityRow {
                    room_id,
                    date: start + Duration::days(i64::try_from(i).unwrap()),
                    price: Money::from_cents(5_000),
                    available_units: *u,
                })
                .collect();
            let nights = i64::try_from(units.len()).unwrap();
            let stay = StayRange::new(start, start + Duration::days(nights)).unwrap();

            match plan_reservation(&ledger, &stay, requested) {
                Ok(plan) => {
                    let after: Vec<AvailabilityRow> = ledger
                        .iter()
                        .zip(&plan.updates)
                        .map(|(row, update)| AvailabilityRow { available_units: update.available_units, ..*row })
                        .collect();
                    let release = plan_release(&after, &stay, requested);
                    prop_assert!(release.missing_dates.is_empty());
                    for (row, update) in ledger.iter().zip(&release.updates) {
                        prop_assert_eq!(row.available_units, update.available_units);
                    }
                }
                Err(BookingError::RoomUnavailable { dates }) => {
                    prop_assert!(!dates.is_empty());
                    prop_assert!(units.iter().any(|u| *u < requested));
                }
                Err(other) => prop_assert!(false, "unexpected error {other:?}"),
            }
        }
    }
}
