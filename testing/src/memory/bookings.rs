use super::{InMemoryDb, SharedDb};
use async_trait::async_trait;
use hotel_booking_core::error::{BookingError, StoreError, StoreResult};
use hotel_booking_core::ledger;
use hotel_booking_core::providers::BookingRepository;
use hotel_booking_core::stay::{DateWindow, StayRange};
use hotel_booking_core::status;
use hotel_booking_core::types::{
    Actor, Booking, BookingId, BookingStatus, HotelId, NewBooking, UserId,
};
use hotel_booking_core::{NaiveDate, Utc};

/// In-memory [`BookingRepository`].
///
/// Runs the same ledger planning as the `PostgreSQL` backend. The write lock
/// is held from the availability check to the booking insert, so concurrent
/// callers serialize the same way they would on row locks.
#[derive(Clone)]
pub struct InMemoryBookingStore {
    db: SharedDb,
}

impl InMemoryBookingStore {
    /// Create a store over `db`.
    #[must_use]
    pub const fn new(db: SharedDb) -> Self {
        Self { db }
    }
}

fn find(db: &InMemoryDb, id: BookingId) -> StoreResult<Booking> {
    db.bookings
        .get(&id)
        .cloned()
        .ok_or(StoreError::Domain(BookingError::BookingNotFound))
}

fn release(db: &mut InMemoryDb, booking: &Booking) -> StoreResult<()> {
    let stay = StayRange::new(booking.check_in, booking.check_out)?;
    let rows = db.rows_in(booking.room_id, &DateWindow::from(stay));

    let mut plan = ledger::plan_release(&rows, &stay, booking.units);
    if let Some(room) = db.rooms.get(&booking.room_id) {
        plan = plan.capped(room.total_units);
    }
    if !plan.is_complete() {
        tracing::warn!(
            booking_id = %booking.id,
            missing = plan.missing_dates.len(),
            "Availability rows deleted since booking; skipping those nights on release"
        );
    }

    db.apply(booking.room_id, &plan.updates);
    Ok(())
}

fn write_status(db: &mut InMemoryDb, id: BookingId, to: BookingStatus) -> StoreResult<Booking> {
    let booking = db
        .bookings
        .get_mut(&id)
        .ok_or(StoreError::Domain(BookingError::BookingNotFound))?;
    let now = Utc::now();
    booking.status = to;
    booking.updated_at = now;
    if to == BookingStatus::Cancelled {
        booking.cancelled_at = Some(now);
    }
    Ok(booking.clone())
}

#[async_trait]
impl BookingRepository for InMemoryBookingStore {
    async fn create(&self, request: &NewBooking, today: NaiveDate) -> StoreResult<Booking> {
        let mut db = self.db.write().unwrap();

        let room = db
            .rooms
            .get(&request.room_id)
            .cloned()
            .ok_or(StoreError::Domain(BookingError::RoomNotFound))?;
        let stay = ledger::check_request(request, &room, today)?;

        let rows = db.rows_in(room.id, &DateWindow::from(stay));
        let plan = ledger::plan_reservation(&rows, &stay, request.units)?;
        db.apply(room.id, &plan.updates);

        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            customer_id: request.customer_id,
            hotel_id: room.hotel_id,
            room_id: room.id,
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            units: request.units,
            guests: request.guests,
            total_price: plan.total_price,
            status: BookingStatus::Pending,
            special_requests: request.special_requests.clone(),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };
        db.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn get(&self, id: BookingId) -> StoreResult<Booking> {
        find(&self.db.read().unwrap(), id)
    }

    async fn cancel(&self, id: BookingId, actor: &Actor, today: NaiveDate) -> StoreResult<Booking> {
        let mut db = self.db.write().unwrap();
        let booking = find(&db, id)?;
        let owner = db.hotel_owner(booking.hotel_id)?;
        status::validate_cancellation(&booking, actor, owner, today)?;

        release(&mut db, &booking)?;
        write_status(&mut db, id, BookingStatus::Cancelled)
    }

    async fn update_status(
        &self,
        id: BookingId,
        to: BookingStatus,
        actor: &Actor,
        today: NaiveDate,
    ) -> StoreResult<Booking> {
        let mut db = self.db.write().unwrap();
        let booking = find(&db, id)?;
        let owner = db.hotel_owner(booking.hotel_id)?;
        status::validate_status_change(&booking, to, actor, owner, today)?;

        if status::releases_inventory(booking.status, to) {
            release(&mut db, &booking)?;
        }
        write_status(&mut db, id, to)
    }

    async fn list_by_customer(&self, customer_id: UserId) -> StoreResult<Vec<Booking>> {
        let db = self.db.read().unwrap();
        let mut bookings: Vec<Booking> = db
            .bookings
            .values()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_by_hotel(&self, hotel_id: HotelId) -> StoreResult<Vec<Booking>> {
        let db = self.db.read().unwrap();
        let mut bookings: Vec<Booking> = db
            .bookings
            .values()
            .filter(|b| b.hotel_id == hotel_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.check_in.cmp(&b.check_in).then(a.created_at.cmp(&b.created_at)));
        Ok(bookings)
    }
}
