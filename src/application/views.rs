use crate::domain::ids::{ReservationId, RoomId};
use crate::domain::listing::Room;
use crate::domain::reservation::{Reservation, ReservationStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One row of a guest's reservation list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
    pub reservation_id: ReservationId,
    pub room_id: RoomId,
    pub room_name: Option<String>,
    pub room_image: Option<String>,
    pub host_name: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_num: u32,
    pub total_cost: Decimal,
    pub status: ReservationStatus,
}

impl ReservationSummary {
    /// `room` may be absent if the listing was removed after booking.
    pub fn new(reservation: &Reservation, room: Option<&Room>) -> Self {
        Self {
            reservation_id: reservation.id,
            room_id: reservation.room_id,
            room_name: room.map(|r| r.name.clone()),
            room_image: room.map(|r| r.room_image.clone()),
            host_name: room.map(|r| r.host_name.clone()),
            check_in: reservation.check_in(),
            check_out: reservation.check_out(),
            guest_num: reservation.guest_count,
            total_cost: reservation.total_cost.value(),
            status: reservation.status,
        }
    }
}

/// Full reservation plus the room, host and location fields shown on the
/// detail screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetail {
    pub reservation_id: ReservationId,
    pub room_id: RoomId,
    pub room_name: String,
    pub room_image: String,
    pub host_name: String,
    pub host_image: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bed_room_num: u32,
    pub bed_num: u32,
    pub bath_room_num: u32,
    pub is_parking: bool,
    pub is_smoking: bool,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_num: u32,
    pub total_cost: Decimal,
    pub status: ReservationStatus,
    pub cancel_reason: Option<String>,
}

impl ReservationDetail {
    pub fn new(reservation: &Reservation, room: &Room) -> Self {
        Self {
            reservation_id: reservation.id,
            room_id: room.id,
            room_name: room.name.clone(),
            room_image: room.room_image.clone(),
            host_name: room.host_name.clone(),
            host_image: room.host_image.clone(),
            address: room.location.address(),
            latitude: room.location.latitude,
            longitude: room.location.longitude,
            bed_room_num: room.bedroom_num,
            bed_num: room.bed_num,
            bath_room_num: room.bathroom_num,
            is_parking: room.is_parking,
            is_smoking: room.is_smoking,
            check_in: reservation.check_in(),
            check_out: reservation.check_out(),
            guest_num: reservation.guest_count,
            total_cost: reservation.total_cost.value(),
            status: reservation.status,
            cancel_reason: reservation
                .cancellation
                .as_ref()
                .map(|cancellation| cancellation.reason.clone()),
        }
    }
}
