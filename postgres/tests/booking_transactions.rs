//! Integration tests for the booking transactions against a real `PostgreSQL`.
//!
//! # Requirements
//!
//! Set `TEST_DATABASE_URL` to a disposable database and run with
//! `cargo test -p hotel-booking-postgres -- --ignored`.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code uses expect for clear failure messages

use chrono::{Duration, NaiveDate, Utc};
use hotel_booking_core::error::{BookingError, StoreError};
use hotel_booking_core::ledger::expand_window;
use hotel_booking_core::providers::{
    BookingRepository, HotelRepository, NewUser, RoomRepository, UserRepository,
};
use hotel_booking_core::stay::DateWindow;
use hotel_booking_core::types::{
    Actor, BookingStatus, HotelDraft, Money, NewBooking, Role, Room, RoomDraft, User,
};
use hotel_booking_postgres::{
    PoolSettings, PostgresBookingRepository, PostgresHotelRepository, PostgresRoomRepository,
    PostgresUserRepository, connect, run_migrations,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = connect(&PoolSettings::new(url)).await.expect("connect");
    run_migrations(&pool).await.expect("migrations");
    pool
}

async fn user(pool: &PgPool, role: Role) -> User {
    PostgresUserRepository::new(pool.clone())
        .create(&NewUser {
            email: format!("{}@example.com", Uuid::new_v4()),
            full_name: "Test User".to_string(),
            role,
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .expect("create user")
}

async fn room_with_units(pool: &PgPool, owner: &User, units: u32, start: NaiveDate, nights: i64) -> Room {
    let hotel = PostgresHotelRepository::new(pool.clone())
        .create(
            owner.id,
            &HotelDraft {
                name: "Integration Inn".to_string(),
                description: String::new(),
                address: "1 Test Way".to_string(),
                city: "Porto".to_string(),
                country: "PT".to_string(),
                latitude: None,
                longitude: None,
                star_rating: 3,
                amenities: vec!["wifi".to_string()],
            },
        )
        .await
        .expect("create hotel");

    let rooms = PostgresRoomRepository::new(pool.clone());
    let room = rooms
        .create(
            hotel.id,
            &RoomDraft {
                name: "Twin".to_string(),
                room_type: "twin".to_string(),
                description: String::new(),
                max_guests: 2,
                base_price: Money::from_cents(9_000),
                total_units: units,
            },
        )
        .await
        .expect("create room");

    let window = DateWindow::new(start, start + Duration::days(nights)).expect("window");
    let rows = expand_window(&room, &window, Money::from_cents(9_000), units).expect("rows");
    rooms.upsert_availability(room.id, &rows).await.expect("upsert");
    room
}

fn request(customer: &User, room: &Room, check_in: NaiveDate, nights: i64) -> NewBooking {
    NewBooking {
        customer_id: customer.id,
        room_id: room.id,
        check_in,
        check_out: check_in + Duration::days(nights),
        units: 1,
        guests: 1,
        special_requests: None,
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn booking_decrements_and_cancel_restores() {
    let pool = pool().await;
    let today = Utc::now().date_naive();
    let start = today + Duration::days(10);

    let owner = user(&pool, Role::HotelOwner).await;
    let customer = user(&pool, Role::Customer).await;
    let room = room_with_units(&pool, &owner, 2, start, 5).await;

    let bookings = PostgresBookingRepository::new(pool.clone());
    let rooms = PostgresRoomRepository::new(pool.clone());

    let booking = bookings
        .create(&request(&customer, &room, start, 3), today)
        .await
        .expect("booking");
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.total_price, Money::from_cents(27_000));

    let window = DateWindow::new(start, start + Duration::days(5)).expect("window");
    let rows = rooms.list_availability(room.id, &window).await.expect("rows");
    let units: Vec<u32> = rows.iter().map(|r| r.available_units).collect();
    assert_eq!(units, vec![1, 1, 1, 2, 2]);

    let cancelled = bookings
        .cancel(booking.id, &Actor::new(customer.id, Role::Customer), today)
        .await
        .expect("cancel");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let rows = rooms.list_availability(room.id, &window).await.expect("rows");
    assert!(rows.iter().all(|r| r.available_units == 2));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn concurrent_bookings_for_last_unit_have_one_winner() {
    let pool = pool().await;
    let today = Utc::now().date_naive();
    let start = today + Duration::days(20);

    let owner = user(&pool, Role::HotelOwner).await;
    let room = room_with_units(&pool, &owner, 1, start, 2).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let customer = user(&pool, Role::Customer).await;
        let request = request(&customer, &room, start, 2);
        handles.push(tokio::spawn(async move {
            PostgresBookingRepository::new(pool).create(&request, today).await
        }));
    }

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("join") {
            Ok(_) => winners += 1,
            Err(StoreError::Domain(BookingError::RoomUnavailable { dates })) => {
                assert_eq!(dates.len(), 2);
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn failed_booking_changes_nothing() {
    let pool = pool().await;
    let today = Utc::now().date_naive();
    let start = today + Duration::days(30);

    let owner = user(&pool, Role::HotelOwner).await;
    let customer = user(&pool, Role::Customer).await;
    // only two of the three requested nights are open
    let room = room_with_units(&pool, &owner, 1, start, 2).await;

    let err = PostgresBookingRepository::new(pool.clone())
        .create(&request(&customer, &room, start, 3), today)
        .await
        .expect_err("third night is missing");
    assert_eq!(
        err,
        StoreError::Domain(BookingError::RoomUnavailable {
            dates: vec![start + Duration::days(2)]
        })
    );

    let window = DateWindow::new(start, start + Duration::days(2)).expect("window");
    let rows = PostgresRoomRepository::new(pool)
        .list_availability(room.id, &window)
        .await
        .expect("rows");
    assert!(rows.iter().all(|r| r.available_units == 1));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn reopening_a_booked_night_nets_out_held_units() {
    let pool = pool().await;
    let today = Utc::now().date_naive();
    let start = today + Duration::days(40);

    let owner = user(&pool, Role::HotelOwner).await;
    let customer = user(&pool, Role::Customer).await;
    let room = room_with_units(&pool, &owner, 2, start, 2).await;

    let bookings = PostgresBookingRepository::new(pool.clone());
    let rooms = PostgresRoomRepository::new(pool.clone());
    let mut full = request(&customer, &room, start, 1);
    full.units = 2;
    full.guests = 2;
    bookings.create(&full, today).await.expect("booking");

    let window = DateWindow::new(start, start + Duration::days(2)).expect("window");
    let repriced = expand_window(&room, &window, Money::from_cents(12_000), 2).expect("rows");
    rooms.upsert_availability(room.id, &repriced).await.expect("upsert");

    let units: Vec<u32> = rooms
        .list_availability(room.id, &window)
        .await
        .expect("rows")
        .iter()
        .map(|r| r.available_units)
        .collect();
    assert_eq!(units, vec![0, 2]);

    let err = bookings.create(&full, today).await.expect_err("night is sold out");
    assert_eq!(err, StoreError::Domain(BookingError::RoomUnavailable { dates: vec![start] }));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn cancellations_and_room_edits_do_not_deadlock() {
    let pool = pool().await;
    let today = Utc::now().date_naive();
    let start = today + Duration::days(50);

    let owner = user(&pool, Role::HotelOwner).await;
    let customer = user(&pool, Role::Customer).await;
    let room = room_with_units(&pool, &owner, 8, start, 3).await;

    let bookings = PostgresBookingRepository::new(pool.clone());
    let mut booked = Vec::new();
    for _ in 0..8 {
        booked.push(bookings.create(&request(&customer, &room, start, 3), today).await.expect("booking"));
    }

    let draft = RoomDraft {
        name: "Twin".to_string(),
        room_type: "twin".to_string(),
        description: "refreshed".to_string(),
        max_guests: 2,
        base_price: Money::from_cents(9_500),
        total_units: 8,
    };
    let mut handles = Vec::new();
    for booking in booked {
        let cancel_pool = pool.clone();
        let actor = Actor::new(customer.id, Role::Customer);
        handles.push(tokio::spawn(async move {
            PostgresBookingRepository::new(cancel_pool).cancel(booking.id, &actor, today).await.map(|_| ())
        }));
        let pool = pool.clone();
        let draft = draft.clone();
        let room_id = room.id;
        handles.push(tokio::spawn(async move {
            PostgresRoomRepository::new(pool).update(room_id, &draft).await.map(|_| ())
        }));
    }

    for handle in handles {
        handle.await.expect("join").expect("no aborted transaction");
    }

    let window = DateWindow::new(start, start + Duration::days(3)).expect("window");
    let rows = PostgresRoomRepository::new(pool)
        .list_availability(room.id, &window)
        .await
        .expect("rows");
    assert!(rows.iter().all(|r| r.available_units == 8));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn room_delete_never_drops_a_concurrent_booking() {
    let pool = pool().await;
    let today = Utc::now().date_naive();
    let start = today + Duration::days(60);

    for _ in 0..10 {
        let owner = user(&pool, Role::HotelOwner).await;
        let customer = user(&pool, Role::Customer).await;
        let room = room_with_units(&pool, &owner, 1, start, 2).await;

        let booking = {
            let pool = pool.clone();
            let request = request(&customer, &room, start, 2);
            tokio::spawn(async move { PostgresBookingRepository::new(pool).create(&request, today).await })
        };
        let delete = {
            let pool = pool.clone();
            let room_id = room.id;
            tokio::spawn(async move { PostgresRoomRepository::new(pool).delete(room_id).await })
        };

        let booking = booking.await.expect("join");
        let delete = delete.await.expect("join");
        match (booking, delete) {
            (Ok(booking), Err(StoreError::Conflict(_))) => {
                let kept = PostgresBookingRepository::new(pool.clone())
                    .get(booking.id)
                    .await
                    .expect("booking survives");
                assert_eq!(kept.status, BookingStatus::Pending);
            }
            (Err(StoreError::Domain(BookingError::RoomNotFound)), Ok(())) => {}
            (booking, delete) => panic!("unexpected outcome: {booking:?} / {delete:?}"),
        }
    }
}
