use super::ids::{ReservationId, RoomId, UserId};
use super::listing::{Room, User};
use super::page::{Page, PageRequest};
use super::reservation::Reservation;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;
}

#[async_trait]
pub trait RoomCatalog: Send + Sync {
    async fn find_room(&self, id: RoomId) -> Result<Option<Room>>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Every reservation ever made for the room, cancelled ones included.
    async fn find_by_room(&self, room_id: RoomId) -> Result<Vec<Reservation>>;
    /// Inserts or replaces the reservation with the same id.
    async fn save(&self, reservation: Reservation) -> Result<Reservation>;
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>>;
    /// The user's non-cancelled reservations, latest check-in first.
    async fn find_by_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<Reservation>>;
    /// Every reservation paid with the receipt, cancelled ones included.
    async fn find_by_receipt(&self, receipt_id: &str) -> Result<Vec<Reservation>>;
}

/// Bearer token issued by the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

/// What the gateway knows about a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptVerification {
    pub confirmed: bool,
    pub amount: Decimal,
    /// Raw gateway status code for the receipt.
    pub status: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Refunded,
    /// Nothing to refund (e.g. the receipt already expired or was cancelled upstream).
    Waived,
    Declined(String),
}

/// Errors are reported as `ReservationError::Payment` for token and
/// verification calls, and `ReservationError::Gateway` for cancellation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken>;
    async fn verify_receipt(
        &self,
        receipt_id: &str,
        token: &AccessToken,
    ) -> Result<ReceiptVerification>;
    /// `requested_by` is the display name of whoever asked for the refund.
    async fn cancel(
        &self,
        receipt_id: &str,
        requested_by: &str,
        reason: &str,
        token: &AccessToken,
    ) -> Result<CancelOutcome>;
}

pub type UserDirectoryBox = Box<dyn UserDirectory>;
pub type RoomCatalogBox = Box<dyn RoomCatalog>;
pub type ReservationStoreBox = Box<dyn ReservationStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
