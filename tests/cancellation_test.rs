mod common;

use common::*;
use kbnb::domain::ids::ReservationId;
use kbnb::domain::ports::{CancelOutcome, ReservationStore};
use kbnb::domain::reservation::{PaymentStatus, Reservation, ReservationStatus};
use kbnb::error::ReservationError;
use kbnb::infrastructure::mock_gateway::MockPaymentGateway;
use rust_decimal_macros::dec;
use std::time::Duration;

async fn booked() -> (Harness, Reservation) {
    let gateway = MockPaymentGateway::new().with_receipt("r-1", dec!(40000));
    let h = harness(gateway).await;
    let reservation = h
        .engine
        .register_reservation(request(GUEST, "2021-02-01", "2021-02-05", dec!(40000), "r-1"))
        .await
        .unwrap();
    (h, reservation)
}

#[tokio::test]
async fn test_owner_cancels_and_is_refunded() {
    let (h, reservation) = booked().await;

    let cancelled = h
        .engine
        .cancel_reservation(reservation.id, GUEST, "flight cancelled")
        .await
        .unwrap();

    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(cancelled.payment.status, PaymentStatus::Cancelled);
    let cancellation = cancelled.cancellation.as_ref().unwrap();
    assert_eq!(cancellation.reason, "flight cancelled");
    assert_eq!(h.gateway.cancelled_receipts(), vec!["r-1".to_string()]);
    assert_eq!(h.gateway.cancel_calls()[0].requested_by, "guest1");
    assert_eq!(h.gateway.cancel_calls()[0].reason, "flight cancelled");

    let stored = h.store.find_by_id(reservation.id).await.unwrap().unwrap();
    assert_eq!(stored, cancelled);
}

#[tokio::test]
async fn test_second_cancel_fails_for_any_caller() {
    let (h, reservation) = booked().await;
    h.engine
        .cancel_reservation(reservation.id, GUEST, "flight cancelled")
        .await
        .unwrap();

    for caller in [GUEST, OTHER_GUEST] {
        let result = h
            .engine
            .cancel_reservation(reservation.id, caller, "again")
            .await;
        assert!(matches!(result, Err(ReservationError::AlreadyCancelled(id)) if id == reservation.id));
    }
    assert_eq!(h.gateway.cancelled_receipts().len(), 1);
}

#[tokio::test]
async fn test_other_guest_cannot_cancel() {
    let (h, reservation) = booked().await;

    let result = h
        .engine
        .cancel_reservation(reservation.id, OTHER_GUEST, "not mine")
        .await;

    assert!(matches!(result, Err(ReservationError::Forbidden(_))));
    assert!(h.gateway.cancelled_receipts().is_empty());
    let stored = h.store.find_by_id(reservation.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);
}

#[tokio::test]
async fn test_unknown_reservation() {
    let (h, _) = booked().await;

    let result = h
        .engine
        .cancel_reservation(ReservationId::new(), GUEST, "typo")
        .await;
    assert!(matches!(
        result,
        Err(ReservationError::NotFound { entity: "Reservation", .. })
    ));
}

#[tokio::test]
async fn test_reason_is_required() {
    let (h, reservation) = booked().await;

    let result = h.engine.cancel_reservation(reservation.id, GUEST, " ").await;
    assert!(matches!(result, Err(ReservationError::Validation(_))));
    assert!(h.gateway.cancelled_receipts().is_empty());
}

#[tokio::test]
async fn test_gateway_failure_keeps_reservation_confirmed() {
    let (h, reservation) = booked().await;
    h.gateway.fail_cancel(true);

    let result = h
        .engine
        .cancel_reservation(reservation.id, GUEST, "flight cancelled")
        .await;

    assert!(matches!(result, Err(ReservationError::Gateway(_))));
    let stored = h.store.find_by_id(reservation.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);
    assert_eq!(stored.payment.status, PaymentStatus::Verified);

    // Once the gateway recovers the same cancellation goes through.
    h.gateway.fail_cancel(false);
    assert!(
        h.engine
            .cancel_reservation(reservation.id, GUEST, "flight cancelled")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_token_failure_is_a_gateway_error() {
    let (h, reservation) = booked().await;
    h.gateway.reject_token(true);

    let result = h
        .engine
        .cancel_reservation(reservation.id, GUEST, "flight cancelled")
        .await;
    assert!(matches!(result, Err(ReservationError::Gateway(_))));
}

#[tokio::test]
async fn test_declined_refund() {
    let (h, reservation) = booked().await;
    h.gateway
        .set_cancel_outcome(CancelOutcome::Declined("settlement closed".to_string()));

    let result = h
        .engine
        .cancel_reservation(reservation.id, GUEST, "flight cancelled")
        .await;

    assert!(matches!(result, Err(ReservationError::Gateway(msg)) if msg.contains("settlement closed")));
    let stored = h.store.find_by_id(reservation.id).await.unwrap().unwrap();
    assert!(!stored.is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_refund_once() {
    let gateway = MockPaymentGateway::new()
        .with_receipt("r-1", dec!(40000))
        .with_cancel_latency(Duration::from_millis(100));
    let h = harness(gateway).await;
    let reservation = h
        .engine
        .register_reservation(request(GUEST, "2021-02-01", "2021-02-05", dec!(40000), "r-1"))
        .await
        .unwrap();

    let id = reservation.id;
    let tasks: Vec<_> = ["one", "two"]
        .into_iter()
        .map(|reason| {
            let engine = h.engine.clone();
            tokio::spawn(async move { engine.cancel_reservation(id, GUEST, reason).await })
        })
        .collect();
    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(ReservationError::AlreadyCancelled(id)) if *id == reservation.id))
    );
    assert_eq!(h.gateway.cancelled_receipts(), vec!["r-1".to_string()]);

    let stored = h.store.find_by_id(reservation.id).await.unwrap().unwrap();
    assert_eq!(
        stored.cancellation.as_ref().unwrap().reason,
        winners[0].cancellation.as_ref().unwrap().reason
    );
}
