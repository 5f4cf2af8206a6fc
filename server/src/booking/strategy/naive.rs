use async_trait::async_trait;
use sqlx::{Any, AnyPool, Row, Transaction};

use super::{CommitStrategy, internal, rollback_quietly};
use crate::error::BookingError;
use crate::seat::model::{SeatRef, SeatStatus};

/// Read-then-write commit with no concurrency discipline of its own.
///
/// Races between concurrent transactions are possible by design; the
/// gatekeeper prevents double-booking in spite of that. Retained as the
/// measurement baseline for the other two strategies.
pub struct NaiveCommit {
    pool: AnyPool,
}

impl NaiveCommit {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommitStrategy for NaiveCommit {
    fn name(&self) -> &'static str {
        "naive"
    }

    async fn commit(
        &self,
        event_id: i64,
        user_id: &str,
        seats: &[SeatRef],
    ) -> Result<(), BookingError> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        match book_in_tx(&mut tx, event_id, user_id, seats).await {
            Ok(()) => tx.commit().await.map_err(internal),
            Err(err) => {
                rollback_quietly(tx).await;
                Err(err)
            }
        }
    }
}

async fn book_in_tx(
    tx: &mut Transaction<'static, Any>,
    event_id: i64,
    user_id: &str,
    seats: &[SeatRef],
) -> Result<(), BookingError> {
    let mut found = 0usize;

    for s in seats {
        let row = sqlx::query(
            r#"
SELECT status
FROM seats
WHERE event_id = ? AND seat_row = ? AND seat_col = ?;
"#,
        )
        .bind(event_id)
        .bind(&s.row)
        .bind(&s.col)
        .fetch_optional(&mut **tx)
        .await
        .map_err(internal)?;

        if let Some(r) = row {
            found += 1;
            if r.get::<String, _>("status") != SeatStatus::Available.as_str() {
                return Err(BookingError::SeatsUnavailable);
            }
        }
    }

    if found < seats.len() {
        return Err(BookingError::SeatsNotFound);
    }

    for s in seats {
        sqlx::query(
            r#"
UPDATE seats
SET status = 'BOOKED', holder = ?
WHERE event_id = ? AND seat_row = ? AND seat_col = ?;
"#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(&s.row)
        .bind(&s.col)
        .execute(&mut **tx)
        .await
        .map_err(internal)?;
    }

    Ok(())
}
