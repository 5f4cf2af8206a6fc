use async_trait::async_trait;
use sqlx::{Any, AnyPool, Row, Transaction};

use super::{CommitStrategy, internal, rollback_quietly};
use crate::error::BookingError;
use crate::seat::model::{SeatRef, SeatStatus};

/// Optimistic commit: fetch without locks, then update each seat predicated
/// on `(status, holder)` being unchanged since the fetch. Any seat whose
/// conditional update matches no row means a concurrent writer got there
/// first; the whole transaction rolls back with a version conflict.
pub struct OptimisticCommit {
    pool: AnyPool,
}

impl OptimisticCommit {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommitStrategy for OptimisticCommit {
    fn name(&self) -> &'static str {
        "optimistic"
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
        // Conditional write: only an untouched (AVAILABLE, no holder) row
        // matches. rows_affected == 0 is the version conflict.
        let res = sqlx::query(
            r#"
UPDATE seats
SET status = 'BOOKED', holder = ?
WHERE event_id = ? AND seat_row = ? AND seat_col = ?
  AND status = 'AVAILABLE' AND holder IS NULL;
"#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(&s.row)
        .bind(&s.col)
        .execute(&mut **tx)
        .await
        .map_err(internal)?;

        if res.rows_affected() != 1 {
            return Err(BookingError::ConflictVersion);
        }
    }

    Ok(())
}
