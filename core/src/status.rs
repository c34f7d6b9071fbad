//! Booking status state machine.
//!
//! ```text
//!   Pending ──► Confirmed ──► Completed
//!      │            │
//!      ├──► Rejected│
//!      └──► Cancelled ◄┘
//! ```
//!
//! `Rejected`, `Cancelled` and `Completed` are terminal.

use crate::error::{BookingError, StoreError, StoreResult};
use crate::types::{Actor, Booking, BookingStatus, NewReview, Role, UserId};
use chrono::NaiveDate;

/// Whether `from → to` is an edge of the state machine.
#[must_use]
pub const fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use crate::types::BookingStatus::{Cancelled, Completed, Confirmed, Pending, Rejected};
    matches!(
        (from, to),
        (Pending, Confirmed | Rejected | Cancelled) | (Confirmed, Completed | Cancelled)
    )
}

/// Whether the status is terminal.
#[must_use]
pub const fn is_terminal(status: BookingStatus) -> bool {
    matches!(
        status,
        BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::Completed
    )
}

/// Whether a booking in `status` still holds units on the ledger.
#[must_use]
pub const fn holds_inventory(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Pending | BookingStatus::Confirmed)
}

/// Whether `from → to` gives units back to the ledger.
#[must_use]
pub const fn releases_inventory(from: BookingStatus, to: BookingStatus) -> bool {
    holds_inventory(from) && matches!(to, BookingStatus::Rejected | BookingStatus::Cancelled)
}

/// Validate a bare transition.
///
/// # Errors
///
/// Returns [`BookingError::InvalidStatusTransition`] for edges outside the machine.
pub fn ensure_transition(from: BookingStatus, to: BookingStatus) -> Result<(), BookingError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(BookingError::InvalidStatusTransition { from, to })
    }
}

/// Validate a status change requested by the hotel side (`PATCH /status`).
///
/// `hotel_owner` is the owner of the booked room's hotel.
///
/// # Errors
///
/// - [`BookingError::Forbidden`] unless the actor owns the hotel or is an admin
/// - [`BookingError::InvalidStatusTransition`] for illegal edges
/// - [`BookingError::StayNotFinished`] when completing before `check_out`
pub fn validate_status_change(
    booking: &Booking,
    to: BookingStatus,
    actor: &Actor,
    hotel_owner: UserId,
    today: NaiveDate,
) -> Result<(), BookingError> {
    if !actor.can_manage(hotel_owner) {
        return Err(BookingError::Forbidden);
    }

    if to == BookingStatus::Cancelled {
        return validate_cancellation(booking, actor, hotel_owner, today);
    }

    ensure_transition(booking.status, to)?;

    if to == BookingStatus::Completed && today < booking.check_out {
        return Err(BookingError::StayNotFinished);
    }

    Ok(())
}

/// Validate a cancellation.
///
/// The booking customer may cancel while `today < check_in`. The hotel owner
/// and admins may cancel until `check_out`.
///
/// # Errors
///
/// - [`BookingError::Forbidden`] for actors unrelated to the booking
/// - [`BookingError::InvalidStatusTransition`] for terminal bookings
/// - [`BookingError::CancellationWindowClosed`] outside the actor's window
pub fn validate_cancellation(
    booking: &Booking,
    actor: &Actor,
    hotel_owner: UserId,
    today: NaiveDate,
) -> Result<(), BookingError> {
    let is_customer = actor.user_id == booking.customer_id;
    let is_hotel_side = actor.can_manage(hotel_owner);

    if !is_customer && !is_hotel_side {
        return Err(BookingError::Forbidden);
    }

    ensure_transition(booking.status, BookingStatus::Cancelled)?;

    let window_end = if is_hotel_side {
        booking.check_out
    } else {
        booking.check_in
    };
    if today >= window_end {
        return Err(BookingError::CancellationWindowClosed);
    }

    Ok(())
}

/// Check that `booking` entitles `review` to be written.
///
/// # Errors
///
/// - [`StoreError::Invalid`] for a rating outside 1..=5 or an unfinished booking
/// - [`StoreError::Forbidden`] if the booking is not the author's stay at that hotel
pub fn check_review_eligibility(review: &NewReview, booking: &Booking) -> StoreResult<()> {
    if !(1..=5).contains(&review.rating) {
        return Err(StoreError::Invalid("rating must be between 1 and 5".to_string()));
    }
    if booking.customer_id != review.author_id || booking.hotel_id != review.hotel_id {
        return Err(StoreError::Forbidden(
            "reviews require your own booking at this hotel".to_string(),
        ));
    }
    if booking.status != BookingStatus::Completed {
        return Err(StoreError::Invalid(
            "only completed stays can be reviewed".to_string(),
        ));
    }
    Ok(())
}

/// Whether `actor` may read `booking`.
#[must_use]
pub fn can_view(booking: &Booking, actor: &Actor, hotel_owner: UserId) -> bool {
    actor.user_id == booking.customer_id || actor.can_manage(hotel_owner)
}

/// Whether `role` may place bookings.
#[must_use]
pub const fn may_book(role: Role) -> bool {
    matches!(role, Role::Customer | Role::Admin)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::{BookingId, HotelId, Money, RoomId};
    use chrono::Utc;
    use crate::types::BookingStatus::{Cancelled, Completed, Confirmed, Pending, Rejected};

    const ALL: [BookingStatus; 5] = [Pending, Confirmed, Rejected, Cancelled, Completed];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn booking(status: BookingStatus, customer_id: UserId) -> Booking {
        Booking {
            id: BookingId::new(),
            customer_id,
            hotel_id: HotelId::new(),
            room_id: RoomId::new(),
            check_in: date(2026, 6, 10),
            check_out: date(2026, 6, 12),
            units: 1,
            guests: 2,
            total_price: Money::from_cents(20_000),
            status,
            special_requests: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            cancelled_at: None,
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for from in [Rejected, Cancelled, Completed] {
            assert!(is_terminal(from));
            for to in ALL {
                assert!(!can_transition(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn allowed_edges() {
        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Pending, Rejected));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Confirmed, Completed));
        assert!(can_transition(Confirmed, Cancelled));
        assert!(!can_transition(Pending, Completed));
        assert!(!can_transition(Confirmed, Rejected));
        assert!(!can_transition(Pending, Pending));
    }

    #[test]
    fn only_held_bookings_release() {
        assert!(releases_inventory(Pending, Rejected));
        assert!(releases_inventory(Confirmed, Cancelled));
        assert!(!releases_inventory(Confirmed, Completed));
        assert!(!releases_inventory(Cancelled, Cancelled));
    }

    #[test]
    fn completion_waits_for_check_out() {
        let owner = UserId::new();
        let actor = Actor::new(owner, Role::HotelOwner);
        let b = booking(Confirmed, UserId::new());

        assert_eq!(
            validate_status_change(&b, Completed, &actor, owner, date(2026, 6, 11)),
            Err(BookingError::StayNotFinished)
        );
        assert!(validate_status_change(&b, Completed, &actor, owner, date(2026, 6, 12)).is_ok());
    }

    #[test]
    fn strangers_cannot_change_status() {
        let owner = UserId::new();
        let b = booking(Pending, UserId::new());
        let stranger = Actor::new(UserId::new(), Role::HotelOwner);
        assert_eq!(
            validate_status_change(&b, Confirmed, &stranger, owner, date(2026, 6, 1)),
            Err(BookingError::Forbidden)
        );

        let admin = Actor::new(UserId::new(), Role::Admin);
        assert!(validate_status_change(&b, Confirmed, &admin, owner, date(2026, 6, 1)).is_ok());
    }

    #[test]
    fn customer_window_closes_at_check_in() {
        let customer = UserId::new();
        let owner = UserId::new();
        let actor = Actor::new(customer, Role::Customer);
        let b = booking(Confirmed, customer);

        assert!(validate_cancellation(&b, &actor, owner, date(2026, 6, 9)).is_ok());
        assert_eq!(
            validate_cancellation(&b, &actor, owner, date(2026, 6, 10)),
            Err(BookingError::CancellationWindowClosed)
        );
    }

    #[test]
    fn hotel_side_may_cancel_until_check_out() {
        let owner = UserId::new();
        let b = booking(Pending, UserId::new());
        let actor = Actor::new(owner, Role::HotelOwner);

        assert!(validate_cancellation(&b, &actor, owner, date(2026, 6, 11)).is_ok());
        assert_eq!(
            validate_cancellation(&b, &actor, owner, date(2026, 6, 12)),
            Err(BookingError::CancellationWindowClosed)
        );
    }

    #[test]
    fn cancelled_bookings_cannot_be_cancelled_again() {
        let customer = UserId::new();
        let b = booking(Cancelled, customer);
        assert_eq!(
            validate_cancellation(&b, &Actor::new(customer, Role::Customer), UserId::new(), date(2026, 6, 1)),
            Err(BookingError::InvalidStatusTransition { from: Cancelled, to: Cancelled })
        );
    }

    #[test]
    fn viewers() {
        let customer = UserId::new();
        let owner = UserId::new();
        let b = booking(Pending, customer);
        assert!(can_view(&b, &Actor::new(customer, Role::Customer), owner));
        assert!(can_view(&b, &Actor::new(owner, Role::HotelOwner), owner));
        assert!(!can_view(&b, &Actor::new(UserId::new(), Role::Customer), owner));
        assert!(may_book(Role::Customer));
        assert!(!may_book(Role::HotelOwner));
    }

    fn review_for(booking: &Booking, rating: u8) -> NewReview {
        NewReview {
            hotel_id: booking.hotel_id,
            booking_id: booking.id,
            author_id: booking.customer_id,
            rating,
            comment: "Lovely".to_string(),
        }
    }

    #[test]
    fn review_eligibility_rules() {
        let b = booking(Completed, UserId::new());
        assert!(check_review_eligibility(&review_for(&b, 5), &b).is_ok());
        assert!(matches!(
            check_review_eligibility(&review_for(&b, 0), &b),
            Err(StoreError::Invalid(_))
        ));

        let mut stranger = review_for(&b, 4);
        stranger.author_id = UserId::new();
        assert!(matches!(check_review_eligibility(&stranger, &b), Err(StoreError::Forbidden(_))));

        let mut other_hotel = review_for(&b, 4);
        other_hotel.hotel_id = HotelId::new();
        assert!(matches!(check_review_eligibility(&other_hotel, &b), Err(StoreError::Forbidden(_))));

        let confirmed = Booking { status: Confirmed, ..b.clone() };
        assert!(matches!(
            check_review_eligibility(&review_for(&confirmed, 4), &confirmed),
            Err(StoreError::Invalid(_))
        ));
    }
}
