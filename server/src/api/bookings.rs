use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::{AppState, error_response};
use crate::error::BookingError;
use crate::seat::model::SeatRef;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub event_id: i64,
    pub user_id: String,
    pub seats: Vec<SeatRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub success: bool,
    pub message: String,
    pub seat_count: usize,
}

/// POST /bookings
///
/// 200 on commit; 409 for every race a client might retry; 400 for input
/// the protocol cannot work with; 503 when the lock store is unreachable.
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = payload else {
        return error_response(&BookingError::Invalid("malformed request body".into()))
            .into_response();
    };

    match state
        .coordinator
        .book_seats(req.event_id, &req.user_id, &req.seats)
        .await
    {
        Ok(receipt) => (
            StatusCode::OK,
            Json(BookingResponse {
                success: true,
                message: format!("booked {} seat(s)", receipt.seat_count),
                seat_count: receipt.seat_count,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
