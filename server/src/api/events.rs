use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::{AppState, error_response};
use crate::error::BookingError;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub date: String,
    pub rows: i64,
    pub cols: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub rows: i64,
    pub cols: i64,
    pub total_seats: i64,
}

/// POST /events
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return error_response(&BookingError::Invalid("malformed request body".into()))
            .into_response();
    };

    match state
        .events
        .create_event(&req.name, &req.date, req.rows, req.cols)
        .await
    {
        Ok(event) => (
            StatusCode::CREATED,
            Json(EventResponse {
                id: event.id,
                name: event.name.clone(),
                date: event.date.clone(),
                rows: event.rows,
                cols: event.cols,
                total_seats: event.total_seats(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct SeatView {
    pub row: String,
    pub col: String,
    pub status: &'static str,
}

/// GET /events/{id}/seats
pub async fn get_event_seats(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Response {
    match state.events.seat_map(event_id).await {
        Ok(Some(seats)) => {
            let view: Vec<SeatView> = seats
                .into_iter()
                .map(|s| SeatView {
                    row: s.row,
                    col: s.col,
                    status: s.status.as_str(),
                })
                .collect();
            (StatusCode::OK, Json(view)).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
