use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// Minimal counters for operational visibility. They never affect behavior;
/// tests use them as call-count oracles for the fast-path guarantees.
#[derive(Clone, Default)]
pub struct Counters {
    pub bookings_requested: Arc<AtomicU64>,
    pub bookings_committed: Arc<AtomicU64>,

    // admission fast path
    pub admission_sold_out: Arc<AtomicU64>,
    pub admission_insufficient: Arc<AtomicU64>,
    pub admission_peeks: Arc<AtomicU64>,
    pub admission_peek_misses: Arc<AtomicU64>,
    pub admission_decrements: Arc<AtomicU64>,

    // gatekeeper
    pub claim_conflicts: Arc<AtomicU64>,
    pub claim_errors: Arc<AtomicU64>,

    // authoritative commit
    pub commit_conflicts: Arc<AtomicU64>,
    pub commit_failures: Arc<AtomicU64>,

    // compensation / reconciliation
    pub release_failures: Arc<AtomicU64>,
    pub reconciler_sweeps: Arc<AtomicU64>,
    pub reconciler_ghosts_released: Arc<AtomicU64>,
}
