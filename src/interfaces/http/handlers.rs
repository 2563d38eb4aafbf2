//! Reservation endpoints.

use super::AppState;
use super::auth::AuthenticatedUser;
use super::error::ApiError;
use crate::application::engine::ReservationRequest;
use crate::application::views::{ReservationDetail, ReservationSummary};
use crate::domain::ids::{ReservationId, RoomId};
use crate::domain::page::Page;
use crate::domain::reservation::ReservationStatus;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const DEFAULT_PAGE: usize = 1;
const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    #[serde(alias = "receipt_id")]
    pub receipt_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReservationBody {
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_number: u32,
    pub total_cost: Decimal,
    pub payment: PaymentBody,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub reservation_id: ReservationId,
    pub status: ReservationStatus,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailQuery {
    pub reservation_id: ReservationId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationBody {
    pub reservation_id: ReservationId,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `POST /reservation`
pub async fn register_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(body): Json<RegisterReservationBody>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let request = ReservationRequest {
        room_id: body.room_id,
        user_id,
        check_in: body.check_in,
        check_out: body.check_out,
        guest_count: body.guest_number,
        total_cost: body.total_cost,
        receipt_id: body.payment.receipt_id,
    };
    let reservation = state.engine.register_reservation(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            reservation_id: reservation.id,
            status: reservation.status,
            message: "Reservation confirmed".to_string(),
        }),
    ))
}

/// `GET /reservation?page=&size=`
pub async fn list_reservations(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ReservationSummary>>, ApiError> {
    let page = state
        .engine
        .list_confirmed_reservations(
            user_id,
            query.page.unwrap_or(DEFAULT_PAGE),
            query.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page))
}

/// `GET /reservation/detail?reservationId=`
pub async fn reservation_detail(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<DetailQuery>,
) -> Result<Json<ReservationDetail>, ApiError> {
    let detail = state
        .engine
        .get_reservation_detail(query.reservation_id, user_id)
        .await?;
    Ok(Json(detail))
}

/// `DELETE /reservation`
pub async fn cancel_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(body): Json<CancelReservationBody>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = state
        .engine
        .cancel_reservation(body.reservation_id, user_id, &body.reason)
        .await?;
    Ok(Json(ReservationResponse {
        reservation_id: reservation.id,
        status: reservation.status,
        message: "Reservation cancelled".to_string(),
    }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
