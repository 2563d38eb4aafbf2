use crate::domain::ids::{ReservationId, RoomId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReservationError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
    #[error("Room {room_id} is not available for the requested dates (conflicts with {conflicting})")]
    DateUnavailable {
        room_id: RoomId,
        conflicting: ReservationId,
    },
    #[error("Payment error: {0}")]
    Payment(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Reservation {0} is already cancelled")]
    AlreadyCancelled(ReservationId),
    #[error("Gateway error: {0}")]
    Gateway(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl ReservationError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReservationError>;
