pub mod naive;
pub mod optimistic;
pub mod pessimistic;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Any, AnyPool, Transaction};

use crate::error::BookingError;
use crate::seat::model::SeatRef;

pub use naive::NaiveCommit;
pub use optimistic::OptimisticCommit;
pub use pessimistic::PessimisticCommit;

/// Authoritative seat-state mutation policy.
///
/// Every strategy books all of `seats` for `user_id` in one seat-store
/// transaction, or none of them. The gatekeeper has already admitted the
/// caller, so the strategy choice affects only how concurrent commits fail,
/// never whether a seat can be sold twice.
#[async_trait]
pub trait CommitStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn commit(
        &self,
        event_id: i64,
        user_id: &str,
        seats: &[SeatRef],
    ) -> Result<(), BookingError>;
}

pub const DEFAULT_STRATEGY: &str = "optimistic";

/// Strategy registry: name -> constructor, falling back to the default on
/// unknown names.
pub fn build(name: &str, pool: &AnyPool) -> Arc<dyn CommitStrategy> {
    match name {
        "naive" => Arc::new(NaiveCommit::new(pool.clone())),
        "pessimistic" => Arc::new(PessimisticCommit::new(pool.clone())),
        "optimistic" => Arc::new(OptimisticCommit::new(pool.clone())),
        other => {
            tracing::warn!(
                strategy = other,
                fallback = DEFAULT_STRATEGY,
                "unknown booking strategy; using fallback"
            );
            Arc::new(OptimisticCommit::new(pool.clone()))
        }
    }
}

/* =========================
Shared helpers
========================= */

pub(crate) fn internal(e: sqlx::Error) -> BookingError {
    BookingError::Internal(e.into())
}

/// Postgres reports a failed `FOR UPDATE NOWAIT` as lock_not_available.
pub(crate) fn is_lock_not_available(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("55P03")
    )
}

/// Rollback on the failure path must not mask the error being returned.
pub(crate) async fn rollback_quietly(tx: Transaction<'static, Any>) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "transaction rollback failed");
    }
}
