#![allow(dead_code)]

use chrono::NaiveDate;
use kbnb::application::engine::{ReservationEngine, ReservationRequest};
use kbnb::domain::clock::FixedClock;
use kbnb::domain::ids::{RoomId, UserId};
use kbnb::domain::listing::{Location, Room, User};
use kbnb::infrastructure::in_memory::{InMemoryDirectory, InMemoryReservationStore};
use kbnb::infrastructure::mock_gateway::MockPaymentGateway;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Every scenario runs on this day, before the February stays under test.
pub const TODAY: &str = "2021-01-20";
pub const ROOM: RoomId = RoomId(1);
pub const OTHER_ROOM: RoomId = RoomId(2);
pub const GUEST: UserId = UserId(1);
pub const OTHER_GUEST: UserId = UserId(2);

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn room(id: RoomId) -> Room {
    Room {
        id,
        name: format!("Room {id}"),
        host_name: "Hong".to_string(),
        host_image: "https://img.example.com/host.png".to_string(),
        room_image: "https://img.example.com/room.png".to_string(),
        location: Location {
            country: "Korea".to_string(),
            city: "Seoul".to_string(),
            borough: "Mapo-gu".to_string(),
            neighborhood: "Yeonnam-dong".to_string(),
            detail_address: "239-5".to_string(),
            latitude: 37.56,
            longitude: 126.92,
        },
        people_limit: 4,
        bed_num: 2,
        bedroom_num: 1,
        bathroom_num: 1,
        is_parking: false,
        is_smoking: false,
    }
}

pub fn user(id: UserId) -> User {
    User {
        id,
        name: format!("guest{id}"),
        email: format!("guest{id}@example.com"),
    }
}

pub struct Harness {
    pub engine: Arc<ReservationEngine>,
    pub store: InMemoryReservationStore,
    pub gateway: MockPaymentGateway,
}

/// An engine over two rooms and two guests, with the clock fixed at `TODAY`.
pub async fn harness(gateway: MockPaymentGateway) -> Harness {
    let directory = InMemoryDirectory::new();
    for id in [ROOM, OTHER_ROOM] {
        directory.add_room(room(id)).await;
    }
    for id in [GUEST, OTHER_GUEST] {
        directory.add_user(user(id)).await;
    }
    let store = InMemoryReservationStore::new();
    let engine = ReservationEngine::new(
        Box::new(directory.clone()),
        Box::new(directory),
        Box::new(store.clone()),
        Box::new(gateway.clone()),
    )
    .with_clock(FixedClock::on(date(TODAY)));

    Harness {
        engine: Arc::new(engine),
        store,
        gateway,
    }
}

pub fn request(
    user_id: UserId,
    check_in: &str,
    check_out: &str,
    total_cost: Decimal,
    receipt_id: &str,
) -> ReservationRequest {
    ReservationRequest {
        room_id: ROOM,
        user_id,
        check_in: date(check_in),
        check_out: date(check_out),
        guest_count: 2,
        total_cost,
        receipt_id: receipt_id.to_string(),
    }
}
