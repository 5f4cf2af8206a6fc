use async_trait::async_trait;
use sqlx::{Any, AnyPool, Row, Transaction};

use super::{CommitStrategy, internal, is_lock_not_available, rollback_quietly};
use crate::error::BookingError;
use crate::seat::model::{SeatRef, SeatStatus};

/// Pessimistic commit: fetch each seat row with a non-blocking exclusive
/// lock (`FOR UPDATE NOWAIT`). A concurrent holder of any row turns into an
/// immediate row-lock conflict instead of a wait.
///
/// The locking clause is Postgres SQL; this strategy is not usable against
/// the sqlite backend the tests run on.
pub struct PessimisticCommit {
    pool: AnyPool,
}

impl PessimisticCommit {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommitStrategy for PessimisticCommit {
    fn name(&self) -> &'static str {
        "pessimistic"
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
WHERE event_id = ? AND seat_row = ? AND seat_col = ?
FOR UPDATE NOWAIT;
"#,
        )
        .bind(event_id)
        .bind(&s.row)
        .bind(&s.col)
        .fetch_optional(&mut **tx)
        .await;

        let row = match row {
            Ok(r) => r,
            Err(e) if is_lock_not_available(&e) => return Err(BookingError::ConflictRowLock),
            Err(e) => return Err(internal(e)),
        };

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
