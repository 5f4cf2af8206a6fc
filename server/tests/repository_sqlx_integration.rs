//! Seat repository and commit strategies over an in-memory sqlite store.
//! The pessimistic strategy's locking SQL needs Postgres and is covered by
//! `pessimistic_row_lock_contention` below, which only runs when
//! SEATGRID_PG_URL points at a real server.

use std::collections::HashSet;
use std::sync::Arc;

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use tokio::task::JoinSet;
use uuid::Uuid;

use seatgrid::booking::strategy::{
    self, CommitStrategy, NaiveCommit, OptimisticCommit, PessimisticCommit,
};
use seatgrid::seat::model::{Event, SeatRef, SeatStatus};
use seatgrid::seat::repository::SeatRepository;
use seatgrid::seat::repository_sqlx::SqlxSeatRepository;
use seatgrid::time::next_id;

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

fn mk_event(rows: i64, cols: i64) -> Event {
    Event {
        id: next_id(),
        name: "flash sale".to_string(),
        date: "2026-09-01T20:00:00Z".to_string(),
        rows,
        cols,
    }
}

async fn seeded_event(pool: &AnyPool, rows: i64, cols: i64) -> (SqlxSeatRepository, Event) {
    let repo = SqlxSeatRepository::new(pool.clone());
    let event = mk_event(rows, cols);
    repo.insert_event_with_seats(&event)
        .await
        .expect("insert event with seats");
    (repo, event)
}

fn seats(pairs: &[(&str, &str)]) -> Vec<SeatRef> {
    pairs.iter().map(|(r, c)| SeatRef::new(*r, *c)).collect()
}

/* =========================
Repository
========================= */

#[tokio::test]
async fn event_creation_materializes_the_full_grid() {
    let pool = setup_db().await;
    let (repo, event) = seeded_event(&pool, 3, 4).await;

    let fetched = repo
        .fetch_event(event.id)
        .await
        .expect("fetch event")
        .expect("event exists");
    assert_eq!(fetched.rows, 3);
    assert_eq!(fetched.cols, 4);
    assert_eq!(fetched.total_seats(), 12);

    let all = repo.fetch_all_seats(event.id).await.expect("fetch seats");
    assert_eq!(all.len(), 12);

    let coords: HashSet<(String, String)> = all
        .iter()
        .map(|s| (s.row.clone(), s.col.clone()))
        .collect();
    assert_eq!(coords.len(), 12, "every (row, col) pair is unique");

    for seat in &all {
        assert_eq!(seat.status, SeatStatus::Available);
        assert_eq!(seat.holder, None);
        assert_eq!(seat.event_id, event.id);
    }
}

#[tokio::test]
async fn fetch_seats_returns_only_existing_rows() {
    let pool = setup_db().await;
    let (repo, event) = seeded_event(&pool, 2, 2).await;

    let got = repo
        .fetch_seats(
            event.id,
            &seats(&[("1", "1"), ("9", "9"), ("2", "2")]),
        )
        .await
        .expect("fetch seats");

    assert_eq!(got.len(), 2, "the phantom seat is simply absent");
}

#[tokio::test]
async fn fetch_available_excludes_booked_seats() {
    let pool = setup_db().await;
    let (repo, event) = seeded_event(&pool, 1, 3).await;

    OptimisticCommit::new(pool.clone())
        .commit(event.id, "u1", &seats(&[("1", "2")]))
        .await
        .expect("commit");

    let available = repo.fetch_available(event.id).await.expect("fetch");
    let fields: HashSet<String> = available.iter().map(SeatRef::lock_field).collect();

    assert_eq!(available.len(), 2);
    assert!(fields.contains("1-1"));
    assert!(!fields.contains("1-2"));
    assert!(fields.contains("1-3"));
}

#[tokio::test]
async fn list_event_ids_sees_every_event() {
    let pool = setup_db().await;
    let (repo, first) = seeded_event(&pool, 1, 1).await;
    let second = mk_event(1, 1);
    repo.insert_event_with_seats(&second).await.expect("insert");

    let ids = repo.list_event_ids().await.expect("list");
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
}

#[tokio::test]
async fn unknown_event_fetches_to_none() {
    let pool = setup_db().await;
    let repo = SqlxSeatRepository::new(pool);

    assert!(repo.fetch_event(123_456).await.expect("fetch").is_none());
}

/* =========================
Commit strategies
========================= */

#[tokio::test]
async fn naive_commit_books_all_requested_seats() {
    let pool = setup_db().await;
    let (repo, event) = seeded_event(&pool, 1, 3).await;

    NaiveCommit::new(pool.clone())
        .commit(event.id, "alice", &seats(&[("1", "1"), ("1", "3")]))
        .await
        .expect("commit");

    let booked = repo
        .fetch_seats(event.id, &seats(&[("1", "1"), ("1", "3")]))
        .await
        .expect("fetch");
    for seat in booked {
        assert_eq!(seat.status, SeatStatus::Booked);
        assert_eq!(seat.holder.as_deref(), Some("alice"));
    }

    // Untouched neighbor
    let rest = repo
        .fetch_seats(event.id, &seats(&[("1", "2")]))
        .await
        .expect("fetch");
    assert_eq!(rest[0].status, SeatStatus::Available);
}

#[tokio::test]
async fn naive_commit_distinguishes_missing_from_taken() {
    let pool = setup_db().await;
    let (_repo, event) = seeded_event(&pool, 1, 1).await;
    let naive = NaiveCommit::new(pool.clone());

    let err = naive
        .commit(event.id, "u1", &seats(&[("7", "7")]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "SEATS_NOT_FOUND");

    naive
        .commit(event.id, "u1", &seats(&[("1", "1")]))
        .await
        .expect("commit");

    let err = naive
        .commit(event.id, "u2", &seats(&[("1", "1")]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "SEATS_UNAVAILABLE");
}

#[tokio::test]
async fn failed_commit_books_nothing() {
    let pool = setup_db().await;
    let (repo, event) = seeded_event(&pool, 1, 2).await;
    let optimistic = OptimisticCommit::new(pool.clone());

    optimistic
        .commit(event.id, "u1", &seats(&[("1", "2")]))
        .await
        .expect("commit");

    // Second booking wants one free and one taken seat; the whole
    // transaction must roll back.
    let err = optimistic
        .commit(event.id, "u2", &seats(&[("1", "1"), ("1", "2")]))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let free = repo
        .fetch_seats(event.id, &seats(&[("1", "1")]))
        .await
        .expect("fetch");
    assert_eq!(
        free[0].status,
        SeatStatus::Available,
        "no partial commit may survive"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn optimistic_racers_never_double_book() {
    // Without the gatekeeper in front, racing commits on the same seat end
    // with at most one winner. The loser's error kind depends on the
    // backend's write-lock behavior, so only the safety property is
    // asserted here.
    let pool = setup_db().await;
    let (repo, event) = seeded_event(&pool, 1, 1).await;

    let mut set = JoinSet::new();
    for user in ["u1", "u2"] {
        let strategy = OptimisticCommit::new(pool.clone());
        let event_id = event.id;
        set.spawn(async move {
            (
                user,
                strategy.commit(event_id, user, &seats(&[("1", "1")])).await,
            )
        });
    }

    let mut winners = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (user, res) = joined.expect("task panicked");
        if res.is_ok() {
            winners.push(user);
        }
    }

    assert!(winners.len() <= 1, "two commits on one seat can never both win");

    let seat = repo
        .fetch_seats(event.id, &seats(&[("1", "1")]))
        .await
        .expect("fetch");
    match winners.first() {
        Some(winner) => assert_eq!(seat[0].holder.as_deref(), Some(*winner)),
        None => assert_eq!(seat[0].status, SeatStatus::Available),
    }
}

#[tokio::test]
async fn registry_resolves_names_and_falls_back() {
    let pool = setup_db().await;

    assert_eq!(strategy::build("naive", &pool).name(), "naive");
    assert_eq!(strategy::build("pessimistic", &pool).name(), "pessimistic");
    assert_eq!(strategy::build("optimistic", &pool).name(), "optimistic");
    assert_eq!(
        strategy::build("does-not-exist", &pool).name(),
        "optimistic",
        "unknown names fall back to the default"
    );
}

/// Row-lock contention needs a real Postgres (`FOR UPDATE NOWAIT`); run
/// with SEATGRID_PG_URL set and `--ignored` to exercise it.
#[tokio::test]
#[ignore]
async fn pessimistic_row_lock_contention() {
    let url = std::env::var("SEATGRID_PG_URL").expect("SEATGRID_PG_URL not set");

    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect postgres");
    seatgrid::db::schema::migrate(&pool).await.expect("migrate");

    let (repo, event) = seeded_event(&pool, 1, 1).await;

    // Hold the row lock in a raw transaction, then let the strategy run
    // into it.
    let mut tx = pool.begin().await.expect("begin");
    sqlx::query("SELECT id FROM seats WHERE event_id = ? AND seat_row = ? AND seat_col = ? FOR UPDATE")
        .bind(event.id)
        .bind("1")
        .bind("1")
        .fetch_one(&mut *tx)
        .await
        .expect("lock row");

    let err = PessimisticCommit::new(pool.clone())
        .commit(event.id, "u1", &seats(&[("1", "1")]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "CONFLICT_ROWLOCK");

    tx.rollback().await.expect("rollback");

    // Lock gone: the commit goes through.
    PessimisticCommit::new(pool.clone())
        .commit(event.id, "u1", &seats(&[("1", "1")]))
        .await
        .expect("commit after lock released");

    let seat = repo
        .fetch_seats(event.id, &seats(&[("1", "1")]))
        .await
        .expect("fetch");
    assert_eq!(seat[0].status, SeatStatus::Booked);
}
