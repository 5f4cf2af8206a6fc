//! Wire-contract tests: routes, status codes and body shapes, served
//! through the real router with sqlite-backed stores and in-process
//! lock-store/admission doubles.


use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum_test::TestServer;
use serde_json::{Value, json};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use uuid::Uuid;

use mock_stores::{MemoryAdmissionCache, MemoryLockStore};
use seatgrid::admission::AdmissionCache;
use seatgrid::api::{AppState, build_router};
use seatgrid::booking::coordinator::BookingCoordinator;
use seatgrid::booking::strategy;
use seatgrid::event::EventService;
use seatgrid::lockstore::SeatLockStore;
use seatgrid::metrics::counters::Counters;
use seatgrid::seat::repository::SeatRepository;
use seatgrid::seat::repository_sqlx::SqlxSeatRepository;

async fn setup_db() -> AnyPool {
    sqlx::any::install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let conn = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&conn)
        .await
        .expect("connect sqlite memory db");

    seatgrid::db::schema::migrate(&pool)
        .await
        .expect("migrate schema");

    pool
}

struct Harness {
    server: TestServer,
    locks: Arc<MemoryLockStore>,
}

async fn harness() -> Harness {
    let pool = setup_db().await;
    let repo: Arc<dyn SeatRepository> = Arc::new(SqlxSeatRepository::new(pool.clone()));
    let locks = Arc::new(MemoryLockStore::default());
    let cache: Arc<dyn AdmissionCache> = Arc::new(MemoryAdmissionCache::default());
    let counters = Counters::default();

    let coordinator = Arc::new(BookingCoordinator::new(
        Arc::clone(&locks) as Arc<dyn SeatLockStore>,
        strategy::build("optimistic", &pool),
        Some(Arc::clone(&cache)),
        counters,
        Duration::from_secs(2),
    ));

    let events = Arc::new(EventService::new(Arc::clone(&repo), Some(cache), 3_600));

    let router = build_router(AppState {
        coordinator,
        events,
        repo,
        locks: Arc::clone(&locks) as Arc<dyn SeatLockStore>,
    });

    Harness {
        server: TestServer::new(router).expect("test server"),
        locks,
    }
}

async fn create_event(server: &TestServer, rows: i64, cols: i64) -> i64 {
    let res = server
        .post("/events")
        .json(&json!({
            "name": "flash sale",
            "date": "2026-09-01T20:00:00Z",
            "rows": rows,
            "cols": cols,
        }))
        .await;
    res.assert_status(axum::http::StatusCode::CREATED);
    res.json::<Value>()["id"].as_i64().expect("event id")
}

/* =========================
Events
========================= */

#[tokio::test]
async fn create_event_returns_201_with_totals() {
    let hx = harness().await;

    let res = hx
        .server
        .post("/events")
        .json(&json!({
            "name": "finals",
            "date": "2026-12-12T19:30:00Z",
            "rows": 2,
            "cols": 5,
        }))
        .await;

    res.assert_status(axum::http::StatusCode::CREATED);
    let body = res.json::<Value>();
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["name"], "finals");
    assert_eq!(body["rows"], 2);
    assert_eq!(body["cols"], 5);
    assert_eq!(body["totalSeats"], 10);
}

#[tokio::test]
async fn create_event_rejects_bad_input_with_400() {
    let hx = harness().await;

    let cases = [
        json!({"name": "x", "date": "2026-01-01T00:00:00Z", "rows": 0, "cols": 5}),
        json!({"name": "", "date": "2026-01-01T00:00:00Z", "rows": 1, "cols": 1}),
        json!({"name": "x", "date": "not-a-date", "rows": 1, "cols": 1}),
    ];
    for body in cases {
        let res = hx.server.post("/events").json(&body).await;
        res.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    // Body that is not JSON at all
    let res = hx
        .server
        .post("/events")
        .content_type("application/json")
        .text("{ this is not json")
        .await;
    res.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn seat_map_round_trips_statuses() {
    let hx = harness().await;
    let event_id = create_event(&hx.server, 1, 2).await;

    let res = hx
        .server
        .post("/bookings")
        .json(&json!({
            "eventId": event_id,
            "userId": "u1",
            "seats": [{"row": "1", "col": "2"}],
        }))
        .await;
    res.assert_status_ok();

    let res = hx.server.get(&format!("/events/{event_id}/seats")).await;
    res.assert_status_ok();

    let body = res.json::<Vec<Value>>();
    assert_eq!(body.len(), 2);
    for seat in &body {
        let expected = if seat["col"] == "2" { "BOOKED" } else { "AVAILABLE" };
        assert_eq!(seat["status"], expected, "seat {seat}");
    }
}

#[tokio::test]
async fn seat_map_of_unknown_event_is_404() {
    let hx = harness().await;
    let res = hx.server.get("/events/999999/seats").await;
    res.assert_status(axum::http::StatusCode::NOT_FOUND);
}

/* =========================
Bookings
========================= */

#[tokio::test]
async fn booking_succeeds_then_conflicts_with_409() {
    let hx = harness().await;
    let event_id = create_event(&hx.server, 1, 2).await;

    let body = json!({
        "eventId": event_id,
        "userId": "alice",
        "seats": [{"row": "1", "col": "1"}, {"row": "1", "col": "2"}],
    });

    let res = hx.server.post("/bookings").json(&body).await;
    res.assert_status_ok();
    let ok = res.json::<Value>();
    assert_eq!(ok["success"], true);
    assert_eq!(ok["seatCount"], 2);

    // Same seats again: the claim is still held, so this is a conflict.
    let res = hx.server.post("/bookings").json(&body).await;
    res.assert_status(axum::http::StatusCode::CONFLICT);
    let err = res.json::<Value>();
    assert_eq!(err["success"], false);
    assert!(err["errorDetails"].as_str().is_some());
}

#[tokio::test]
async fn booking_with_no_seats_is_400() {
    let hx = harness().await;
    let event_id = create_event(&hx.server, 1, 1).await;

    let res = hx
        .server
        .post("/bookings")
        .json(&json!({
            "eventId": event_id,
            "userId": "alice",
            "seats": [],
        }))
        .await;
    res.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_unknown_seats_is_409() {
    let hx = harness().await;
    let event_id = create_event(&hx.server, 1, 1).await;

    let res = hx
        .server
        .post("/bookings")
        .json(&json!({
            "eventId": event_id,
            "userId": "alice",
            "seats": [{"row": "9", "col": "9"}],
        }))
        .await;
    res.assert_status(axum::http::StatusCode::CONFLICT);
    assert_eq!(res.json::<Value>()["errorDetails"], "SEATS_NOT_FOUND");
}

#[tokio::test]
async fn lock_store_outage_maps_to_503() {
    let hx = harness().await;
    let event_id = create_event(&hx.server, 1, 1).await;

    hx.locks.fail_claims.store(true, Ordering::SeqCst);

    let res = hx
        .server
        .post("/bookings")
        .json(&json!({
            "eventId": event_id,
            "userId": "alice",
            "seats": [{"row": "1", "col": "1"}],
        }))
        .await;
    res.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.json::<Value>()["errorDetails"], "UNAVAILABLE");
}

/* =========================
Health
========================= */

#[tokio::test]
async fn liveness_is_always_200() {
    let hx = harness().await;
    hx.server.get("/health/live").await.assert_status_ok();
}

#[tokio::test]
async fn readiness_follows_the_lock_store() {
    let hx = harness().await;

    hx.server.get("/health/ready").await.assert_status_ok();

    hx.locks.fail_claims.store(true, Ordering::SeqCst);
    let res = hx.server.get("/health/ready").await;
    res.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.json::<Value>()["ready"], false);
}
