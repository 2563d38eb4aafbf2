use super::ids::{PaymentId, ReservationId, RoomId, UserId};
use crate::error::{ReservationError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Total price of a stay.
///
/// Wraps `rust_decimal::Decimal` so a reservation can never carry a zero or
/// negative cost.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cost(Decimal);

impl Cost {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ReservationError::Validation(
                "Total cost must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Cost {
    type Error = ReservationError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Cost> for Decimal {
    fn from(cost: Cost) -> Self {
        cost.0
    }
}

/// A half-open stay `[check_in, check_out)`.
///
/// The guest leaves on `check_out`, so another stay may start that same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayPeriod {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayPeriod {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_in >= check_out {
            return Err(ReservationError::InvalidDateRange(format!(
                "check-in {check_in} must be before check-out {check_out}"
            )));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Rejects stays with either date strictly before `today`.
    pub fn ensure_not_before(&self, today: NaiveDate) -> Result<()> {
        if self.check_in < today || self.check_out < today {
            return Err(ReservationError::InvalidDateRange(format!(
                "stay {} to {} starts before today ({today})",
                self.check_in, self.check_out
            )));
        }
        Ok(())
    }

    pub fn overlaps(&self, other: &StayPeriod) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Requested,
    Verified,
    Cancelled,
}

/// Payment attached to a reservation. Only carries the gateway receipt.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: PaymentId,
    pub receipt_id: String,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn new(receipt_id: impl Into<String>) -> Self {
        Self {
            id: PaymentId::new(),
            receipt_id: receipt_id.into(),
            status: PaymentStatus::Requested,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Cancellation {
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

/// A guest's booking of a room.
///
/// Dates and cost are fixed at creation. After confirmation the only allowed
/// transition is to `Cancelled`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Reservation {
    pub id: ReservationId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub period: StayPeriod,
    pub guest_count: u32,
    pub total_cost: Cost,
    pub status: ReservationStatus,
    pub payment: Payment,
    pub created_at: DateTime<Utc>,
    pub cancellation: Option<Cancellation>,
}

impl Reservation {
    pub fn pending(
        room_id: RoomId,
        user_id: UserId,
        period: StayPeriod,
        guest_count: u32,
        total_cost: Cost,
        payment: Payment,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            room_id,
            user_id,
            period,
            guest_count,
            total_cost,
            status: ReservationStatus::Pending,
            payment,
            created_at,
            cancellation: None,
        }
    }

    pub fn check_in(&self) -> NaiveDate {
        self.period.check_in()
    }

    pub fn check_out(&self) -> NaiveDate {
        self.period.check_out()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ReservationStatus::Cancelled
    }

    /// Marks a pending reservation confirmed once its payment is verified.
    pub fn confirm(&mut self) -> Result<()> {
        if self.status != ReservationStatus::Pending {
            return Err(ReservationError::Validation(format!(
                "Reservation {} cannot be confirmed from {:?}",
                self.id, self.status
            )));
        }
        self.status = ReservationStatus::Confirmed;
        self.payment.status = PaymentStatus::Verified;
        Ok(())
    }

    /// Cancels a confirmed reservation, recording why and when.
    pub fn cancel(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        match self.status {
            ReservationStatus::Cancelled => Err(ReservationError::AlreadyCancelled(self.id)),
            ReservationStatus::Pending => Err(ReservationError::Validation(format!(
                "Reservation {} was never confirmed",
                self.id
            ))),
            ReservationStatus::Confirmed => {
                self.status = ReservationStatus::Cancelled;
                self.payment.status = PaymentStatus::Cancelled;
                self.cancellation = Some(Cancellation {
                    reason: reason.into(),
                    cancelled_at: at,
                });
                Ok(())
            }
        }
    }

    /// Whether this reservation blocks `period` on its room.
    pub fn blocks(&self, period: &StayPeriod) -> bool {
        self.status == ReservationStatus::Confirmed && self.period.overlaps(period)
    }
}

/// Returns the first confirmed reservation whose stay intersects `period`.
pub fn find_conflict<'a>(
    existing: &'a [Reservation],
    period: &StayPeriod,
) -> Option<&'a Reservation> {
    existing.iter().find(|reservation| reservation.blocks(period))
}
