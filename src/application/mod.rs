//! Application layer containing the reservation workflow.
//!
//! This module defines the `ReservationEngine`, the entry point for admitting,
//! listing and cancelling reservations. Per-key serialization (rooms, receipts,
//! reservations) lives in `keyed_locks`.

pub mod engine;
pub mod keyed_locks;
pub mod views;
