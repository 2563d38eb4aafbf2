//! Maps engine errors to HTTP responses.

use crate::error::ReservationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Error returned by the HTTP handlers, rendered as `{code, message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        let (status, code) = match &err {
            ReservationError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ReservationError::InvalidDateRange(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE_RANGE"),
            ReservationError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ReservationError::DateUnavailable { .. } => (StatusCode::CONFLICT, "DATE_UNAVAILABLE"),
            ReservationError::AlreadyCancelled(_) => (StatusCode::CONFLICT, "ALREADY_CANCELLED"),
            ReservationError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ReservationError::Payment(_) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED"),
            ReservationError::Gateway(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        };
        if status.is_server_error() {
            tracing::error!(%status, code, error = %err, "Request failed");
        }
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };
        Self::new(status, code, message)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
