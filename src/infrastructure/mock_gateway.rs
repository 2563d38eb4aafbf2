//! Scriptable payment gateway for development and testing.
//!
//! Receipts are registered up front with the amount they captured. Failures
//! (token rejection, cancellation refusal, network errors) are switched on
//! per instance, and every cancel call is recorded so callers can assert on
//! compensations.

use crate::domain::ports::{AccessToken, CancelOutcome, PaymentGateway, ReceiptVerification};
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Gateway status code for a captured receipt.
pub const RECEIPT_CONFIRMED: i32 = 1;
/// Gateway status code for an unknown or unpaid receipt.
pub const RECEIPT_NOT_PAID: i32 = 0;

/// One recorded `cancel` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelCall {
    pub receipt_id: String,
    pub requested_by: String,
    pub reason: String,
}

#[derive(Debug)]
struct MockState {
    receipts: HashMap<String, Decimal>,
    reject_token: bool,
    fail_verification: bool,
    fail_cancel: bool,
    cancel_outcome: CancelOutcome,
    latency: Duration,
    cancel_latency: Duration,
    verify_calls: usize,
    cancelled: Vec<CancelCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            receipts: HashMap::new(),
            reject_token: false,
            fail_verification: false,
            fail_cancel: false,
            cancel_outcome: CancelOutcome::Refunded,
            latency: Duration::ZERO,
            cancel_latency: Duration::ZERO,
            verify_calls: 0,
            cancelled: Vec::new(),
        }
    }
}

/// Clones share state, so a test can keep one handle and box the other.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a captured receipt.
    pub fn with_receipt(self, receipt_id: impl Into<String>, amount: Decimal) -> Self {
        self.state().receipts.insert(receipt_id.into(), amount);
        self
    }

    /// Delays every verification, to widen race windows in tests.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = latency;
        self
    }

    /// Delays every cancellation.
    pub fn with_cancel_latency(self, latency: Duration) -> Self {
        self.state().cancel_latency = latency;
        self
    }

    pub fn reject_token(&self, reject: bool) {
        self.state().reject_token = reject;
    }

    pub fn fail_verification(&self, fail: bool) {
        self.state().fail_verification = fail;
    }

    pub fn fail_cancel(&self, fail: bool) {
        self.state().fail_cancel = fail;
    }

    pub fn set_cancel_outcome(&self, outcome: CancelOutcome) {
        self.state().cancel_outcome = outcome;
    }

    pub fn verify_calls(&self) -> usize {
        self.state().verify_calls
    }

    /// Receipt ids passed to `cancel`, in call order.
    pub fn cancelled_receipts(&self) -> Vec<String> {
        self.state()
            .cancelled
            .iter()
            .map(|call| call.receipt_id.clone())
            .collect()
    }

    pub fn cancel_calls(&self) -> Vec<CancelCall> {
        self.state().cancelled.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn access_token(&self) -> Result<AccessToken> {
        if self.state().reject_token {
            return Err(ReservationError::Payment(
                "Gateway rejected the credentials".to_string(),
            ));
        }
        Ok(AccessToken("mock-token".to_string()))
    }

    async fn verify_receipt(
        &self,
        receipt_id: &str,
        _token: &AccessToken,
    ) -> Result<ReceiptVerification> {
        let latency = {
            let mut state = self.state();
            state.verify_calls += 1;
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let state = self.state();
        if state.fail_verification {
            return Err(ReservationError::Payment(
                "Gateway timed out".to_string(),
            ));
        }
        let verification = match state.receipts.get(receipt_id) {
            Some(amount) => ReceiptVerification {
                confirmed: true,
                amount: *amount,
                status: RECEIPT_CONFIRMED,
            },
            None => ReceiptVerification {
                confirmed: false,
                amount: Decimal::ZERO,
                status: RECEIPT_NOT_PAID,
            },
        };
        Ok(verification)
    }

    async fn cancel(
        &self,
        receipt_id: &str,
        requested_by: &str,
        reason: &str,
        _token: &AccessToken,
    ) -> Result<CancelOutcome> {
        let latency = self.state().cancel_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state();
        if state.fail_cancel {
            return Err(ReservationError::Gateway(
                "Gateway unreachable".to_string(),
            ));
        }
        state.cancelled.push(CancelCall {
            receipt_id: receipt_id.to_string(),
            requested_by: requested_by.to_string(),
            reason: reason.to_string(),
        });
        Ok(state.cancel_outcome.clone())
    }
}
