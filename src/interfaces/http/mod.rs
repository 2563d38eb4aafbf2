//! REST surface over the reservation engine.

pub mod auth;
pub mod error;
pub mod handlers;

use crate::application::engine::ReservationEngine;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReservationEngine>,
}

/// Builds the application router.
pub fn router(engine: Arc<ReservationEngine>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/reservation",
            post(handlers::register_reservation)
                .get(handlers::list_reservations)
                .delete(handlers::cancel_reservation),
        )
        .route("/reservation/detail", get(handlers::reservation_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}
