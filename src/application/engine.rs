use super::keyed_locks::KeyedLocks;
use super::views::{ReservationDetail, ReservationSummary};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::ids::{ReservationId, RoomId, UserId};
use crate::domain::page::{Page, PageRequest};
use crate::domain::ports::{
    AccessToken, CancelOutcome, PaymentGatewayBox, ReservationStoreBox, RoomCatalogBox,
    UserDirectoryBox,
};
use crate::domain::reservation::{Cost, Payment, Reservation, StayPeriod, find_conflict};
use crate::error::{ReservationError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

/// Reason sent to the gateway when a verified payment has to be returned
/// because the dates were taken while it was being verified.
const LOST_RACE_REASON: &str = "Requested dates were booked by another guest";

/// Input of an admission attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationRequest {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: u32,
    pub total_cost: Decimal,
    pub receipt_id: String,
}

/// Turns reservation requests into confirmed reservations.
///
/// `ReservationEngine` validates a request against the room's existing
/// reservations, verifies the guest's payment with the gateway and only then
/// persists. The final overlap check and the insert run under a per-room lock;
/// the gateway is never called while that lock is held. A receipt lock keeps
/// one payment from backing two reservations, and cancellations of the same
/// reservation run one at a time.
pub struct ReservationEngine {
    users: UserDirectoryBox,
    rooms: RoomCatalogBox,
    reservations: ReservationStoreBox,
    gateway: PaymentGatewayBox,
    clock: Box<dyn Clock>,
    room_locks: KeyedLocks<RoomId>,
    receipt_locks: KeyedLocks<String>,
    cancel_locks: KeyedLocks<ReservationId>,
}

impl ReservationEngine {
    /// Creates a new `ReservationEngine` using the system clock.
    ///
    /// # Arguments
    ///
    /// * `users` - Lookup for the guests making reservations.
    /// * `rooms` - Lookup for the rooms being reserved.
    /// * `reservations` - Where reservations are persisted.
    /// * `gateway` - The payment gateway used to verify and refund receipts.
    pub fn new(
        users: UserDirectoryBox,
        rooms: RoomCatalogBox,
        reservations: ReservationStoreBox,
        gateway: PaymentGatewayBox,
    ) -> Self {
        Self {
            users,
            rooms,
            reservations,
            gateway,
            clock: Box::new(SystemClock),
            room_locks: KeyedLocks::new(),
            receipt_locks: KeyedLocks::new(),
            cancel_locks: KeyedLocks::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Admits a reservation.
    ///
    /// Checks run in order and stop at the first failure: room and user
    /// exist, the dates are sane, the request is well formed, the dates are
    /// free. Then the receipt is verified and the reservation is stored as
    /// confirmed. Nothing is stored unless the payment is verified.
    pub async fn register_reservation(&self, request: ReservationRequest) -> Result<Reservation> {
        let room = self
            .rooms
            .find_room(request.room_id)
            .await?
            .ok_or_else(|| ReservationError::not_found("Room", request.room_id))?;
        let user = self
            .users
            .find_user(request.user_id)
            .await?
            .ok_or_else(|| ReservationError::not_found("User", request.user_id))?;

        let period = StayPeriod::new(request.check_in, request.check_out)?;
        period.ensure_not_before(self.clock.today())?;

        if request.guest_count == 0 || request.guest_count > room.people_limit {
            return Err(ReservationError::Validation(format!(
                "Guest count must be between 1 and {} for room {}",
                room.people_limit, room.id
            )));
        }
        let total_cost = Cost::new(request.total_cost)?;
        let receipt_id = request.receipt_id.trim();
        if receipt_id.is_empty() {
            return Err(ReservationError::Validation(
                "Payment receipt id is required".to_string(),
            ));
        }

        // Fast-path rejection; repeated under the room lock before inserting.
        self.ensure_available(room.id, &period).await?;

        let mut reservation = Reservation::pending(
            room.id,
            request.user_id,
            period,
            request.guest_count,
            total_cost,
            Payment::new(receipt_id),
            self.clock.now(),
        );

        // Held until the reservation is stored, so a concurrent replay of the
        // same receipt sees it.
        let _receipt_guard = self.receipt_locks.acquire(receipt_id.to_string()).await;
        self.ensure_receipt_unused(receipt_id).await?;

        let token = self.verify_payment(&reservation).await?;

        let guard = self.room_locks.acquire(room.id).await;
        let committed = match self.ensure_available(room.id, &period).await {
            Ok(()) => {
                reservation.confirm()?;
                self.reservations.save(reservation.clone()).await
            }
            Err(e) => Err(e),
        };
        drop(guard);

        match committed {
            Ok(saved) => {
                info!(
                    reservation_id = %saved.id,
                    room_id = %saved.room_id,
                    user_id = %saved.user_id,
                    check_in = %saved.check_in(),
                    check_out = %saved.check_out(),
                    "Reservation confirmed"
                );
                Ok(saved)
            }
            Err(e) => {
                warn!(
                    room_id = %room.id,
                    receipt_id = %reservation.payment.receipt_id,
                    error = %e,
                    "Verified reservation could not be committed; returning payment"
                );
                self.return_payment(&reservation, &user.name, &token).await;
                Err(e)
            }
        }
    }

    /// Cancels one of the requester's reservations and refunds its payment.
    ///
    /// The reservation stays confirmed unless the gateway refunds the receipt
    /// or reports that no refund is needed. Cancellations of one reservation
    /// are serialized, so only the first of two concurrent calls refunds.
    pub async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        requester: UserId,
        reason: &str,
    ) -> Result<Reservation> {
        let _guard = self.cancel_locks.acquire(reservation_id).await;
        let mut reservation = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| ReservationError::not_found("Reservation", reservation_id))?;

        if reservation.is_cancelled() {
            return Err(ReservationError::AlreadyCancelled(reservation_id));
        }
        if reservation.user_id != requester {
            warn!(
                reservation_id = %reservation_id,
                user_id = %requester,
                "Cancellation attempted by a user who does not own the reservation"
            );
            return Err(ReservationError::Forbidden(format!(
                "Reservation {reservation_id} does not belong to user {requester}"
            )));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ReservationError::Validation(
                "A cancellation reason is required".to_string(),
            ));
        }

        let requested_by = match self.users.find_user(requester).await? {
            Some(user) => user.name,
            None => requester.to_string(),
        };

        let token = self.gateway.access_token().await.map_err(as_gateway_error)?;
        let outcome = self
            .gateway
            .cancel(&reservation.payment.receipt_id, &requested_by, reason, &token)
            .await
            .map_err(as_gateway_error)?;
        if let CancelOutcome::Declined(message) = &outcome {
            warn!(
                reservation_id = %reservation_id,
                receipt_id = %reservation.payment.receipt_id,
                %message,
                "Gateway declined the refund"
            );
            return Err(ReservationError::Gateway(message.clone()));
        }

        let receipt_id = reservation.payment.receipt_id.clone();
        reservation.cancel(reason, self.clock.now())?;
        let saved = match self.reservations.save(reservation).await {
            Ok(saved) => saved,
            Err(e) => {
                error!(
                    reservation_id = %reservation_id,
                    %receipt_id,
                    ?outcome,
                    error = %e,
                    "Payment was refunded but the cancellation could not be stored"
                );
                return Err(e);
            }
        };
        info!(
            reservation_id = %saved.id,
            user_id = %saved.user_id,
            ?outcome,
            "Reservation cancelled"
        );
        Ok(saved)
    }

    /// A page of the user's non-cancelled reservations, latest check-in first.
    pub async fn list_confirmed_reservations(
        &self,
        user_id: UserId,
        page: usize,
        page_size: usize,
    ) -> Result<Page<ReservationSummary>> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| ReservationError::not_found("User", user_id))?;
        let request = PageRequest::new(page, page_size)?;

        let reservations = self.reservations.find_by_user(user_id, request).await?;
        let mut summaries = Vec::with_capacity(reservations.items.len());
        for reservation in &reservations.items {
            let room = self.rooms.find_room(reservation.room_id).await?;
            summaries.push(ReservationSummary::new(reservation, room.as_ref()));
        }
        Ok(reservations.with_items(summaries))
    }

    /// One of the requester's reservations with its room details.
    ///
    /// Reservations owned by someone else, and ids that do not exist, are both
    /// reported as forbidden.
    pub async fn get_reservation_detail(
        &self,
        reservation_id: ReservationId,
        requester: UserId,
    ) -> Result<ReservationDetail> {
        let reservation = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .filter(|r| r.user_id == requester)
            .ok_or_else(|| {
                ReservationError::Forbidden(format!(
                    "Reservation {reservation_id} is not one of user {requester}'s reservations"
                ))
            })?;
        let room = self
            .rooms
            .find_room(reservation.room_id)
            .await?
            .ok_or_else(|| ReservationError::not_found("Room", reservation.room_id))?;
        Ok(ReservationDetail::new(&reservation, &room))
    }

    async fn ensure_available(&self, room_id: RoomId, period: &StayPeriod) -> Result<()> {
        let existing = self.reservations.find_by_room(room_id).await?;
        if let Some(conflict) = find_conflict(&existing, period) {
            warn!(
                room_id = %room_id,
                conflicting = %conflict.id,
                check_in = %period.check_in(),
                check_out = %period.check_out(),
                "Requested dates overlap an existing reservation"
            );
            return Err(ReservationError::DateUnavailable {
                room_id,
                conflicting: conflict.id,
            });
        }
        Ok(())
    }

    async fn ensure_receipt_unused(&self, receipt_id: &str) -> Result<()> {
        let holders = self.reservations.find_by_receipt(receipt_id).await?;
        if let Some(holder) = holders.iter().find(|r| !r.is_cancelled()) {
            warn!(
                %receipt_id,
                reservation_id = %holder.id,
                "Receipt already backs another reservation"
            );
            return Err(ReservationError::Payment(format!(
                "Receipt {receipt_id} already pays for reservation {}",
                holder.id
            )));
        }
        Ok(())
    }

    async fn verify_payment(&self, reservation: &Reservation) -> Result<AccessToken> {
        let receipt_id = &reservation.payment.receipt_id;
        let token = self.gateway.access_token().await.map_err(as_payment_error)?;
        let verification = self
            .gateway
            .verify_receipt(receipt_id, &token)
            .await
            .map_err(as_payment_error)?;

        if !verification.confirmed {
            warn!(%receipt_id, status = verification.status, "Receipt is not confirmed");
            return Err(ReservationError::Payment(format!(
                "Receipt {receipt_id} is not confirmed (status {})",
                verification.status
            )));
        }
        if verification.amount != reservation.total_cost.value() {
            warn!(
                %receipt_id,
                paid = %verification.amount,
                expected = %reservation.total_cost.value(),
                "Receipt amount does not match the reservation cost"
            );
            return Err(ReservationError::Payment(format!(
                "Receipt {receipt_id} paid {} but the reservation costs {}",
                verification.amount,
                reservation.total_cost.value()
            )));
        }
        Ok(token)
    }

    /// Best-effort refund of a receipt that was verified but never committed.
    async fn return_payment(&self, reservation: &Reservation, guest_name: &str, token: &AccessToken) {
        let receipt_id = &reservation.payment.receipt_id;
        match self
            .gateway
            .cancel(receipt_id, guest_name, LOST_RACE_REASON, token)
            .await
        {
            Ok(CancelOutcome::Declined(message)) => {
                error!(%receipt_id, %message, "Gateway declined refund of an uncommitted payment");
            }
            Ok(_) => info!(%receipt_id, "Uncommitted payment returned"),
            Err(e) => {
                error!(%receipt_id, error = %e, "Failed to return an uncommitted payment");
            }
        }
    }
}

fn as_payment_error(err: ReservationError) -> ReservationError {
    match err {
        ReservationError::Payment(_) => err,
        other => ReservationError::Payment(other.to_string()),
    }
}

fn as_gateway_error(err: ReservationError) -> ReservationError {
    match err {
        ReservationError::Gateway(_) => err,
        other => ReservationError::Gateway(other.to_string()),
    }
}
