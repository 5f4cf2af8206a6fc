//! HTTP surface: wire contract, routing and error mapping.

pub mod bookings;
pub mod events;
pub mod health;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::booking::coordinator::BookingCoordinator;
use crate::error::BookingError;
use crate::event::EventService;
use crate::lockstore::SeatLockStore;
use crate::seat::repository::SeatRepository;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<BookingCoordinator>,
    pub events: Arc<EventService>,
    pub repo: Arc<dyn SeatRepository>,
    pub locks: Arc<dyn SeatLockStore>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(events::create_event))
        .route("/events/:id/seats", get(events::get_event_seats))
        .route("/bookings", post(bookings::create_booking))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .with_state(state)
}

/// Uniform error body. Conflict kinds stay distinguishable through
/// `errorDetails`; the status code is what clients branch on.
pub(crate) fn error_response(err: &BookingError) -> (StatusCode, Json<serde_json::Value>) {
    if matches!(err, BookingError::Internal(_)) {
        // 5xx in steady state is a bug; keep the evidence.
        tracing::error!(error = ?err, "internal error surfaced to client");
    }

    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "success": false,
            "message": err.to_string(),
            "errorDetails": err.kind(),
        })),
    )
}
