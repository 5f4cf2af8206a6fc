use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub seat_store: bool,
    pub lock_store: bool,
}

/// GET /health/live — the process is up.
pub async fn live() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready — 200 iff both backing stores answer.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let seat_store = state.repo.list_event_ids().await.is_ok();
    let lock_store = state.locks.ping().await.is_ok();
    let ready = seat_store && lock_store;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            seat_store,
            lock_store,
        }),
    )
}
