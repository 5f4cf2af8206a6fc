pub mod redis;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use crate::metrics::counters::Counters;

pub use self::redis::RedisAdmissionCache;

/// Advisory per-event remaining-seat counter.
///
/// Strictly a fast-path hint: a zero is a sufficient sold-out signal, a
/// positive value proves nothing, and no commit decision may depend on it.
/// Every operation is therefore best-effort; errors are logged, never
/// propagated.
#[async_trait]
pub trait AdmissionCache: Send + Sync {
    /// Remaining-seat hint, or `None` on miss or error (callers skip the
    /// fast path in that case).
    async fn peek(&self, event_id: i64) -> Option<i64>;

    /// Atomically subtracts `by`, clamping the stored value at zero.
    async fn decrement(&self, event_id: i64, by: i64);

    /// Sets the counter with a TTL. Called once per event at creation.
    async fn seed(&self, event_id: i64, initial: i64, ttl_secs: u64);
}

/// Lock-store key for an event's remaining-seat counter.
pub fn available_key(event_id: i64) -> String {
    format!("event:{event_id}:available")
}

/// Metrics decorator. Keeps the cache implementations free of
/// observability concerns; wired around the real cache at composition time.
pub struct CountedAdmissionCache {
    inner: Arc<dyn AdmissionCache>,
    counters: Counters,
}

impl CountedAdmissionCache {
    pub fn new(inner: Arc<dyn AdmissionCache>, counters: Counters) -> Self {
        Self { inner, counters }
    }
}

#[async_trait]
impl AdmissionCache for CountedAdmissionCache {
    async fn peek(&self, event_id: i64) -> Option<i64> {
        self.counters.admission_peeks.fetch_add(1, Ordering::Relaxed);
        let out = self.inner.peek(event_id).await;
        if out.is_none() {
            self.counters
                .admission_peek_misses
                .fetch_add(1, Ordering::Relaxed);
        }
        out
    }

    async fn decrement(&self, event_id: i64, by: i64) {
        self.counters
            .admission_decrements
            .fetch_add(1, Ordering::Relaxed);
        self.inner.decrement(event_id, by).await;
    }

    async fn seed(&self, event_id: i64, initial: i64, ttl_secs: u64) {
        self.inner.seed(event_id, initial, ttl_secs).await;
    }
}
