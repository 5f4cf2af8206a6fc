pub mod redis;

use anyhow::Result;
use async_trait::async_trait;

pub use self::redis::RedisSeatLockStore;

/// Per-event seat claim store. The gatekeeper for the whole booking
/// pipeline: `try_claim` is the single global serialization point.
///
/// Field strings are the `"row-col"` form produced by
/// [`crate::seat::model::SeatRef::lock_field`].
///
/// Contract: `try_claim` and `release` over the same event key are
/// linearizable. Implementations must realize the all-or-none claim as one
/// server-side atomic operation; two client round-trips would void the
/// no-double-booking argument.
#[async_trait]
pub trait SeatLockStore: Send + Sync {
    /// Claims every field for this event, or none of them.
    ///
    /// Returns `false` (writing nothing) if any field is already present.
    /// An error means the claim outcome is unknown; callers must treat it
    /// as "not claimed" and must not proceed to commit.
    async fn try_claim(&self, event_id: i64, fields: &[String], now_ms: u64) -> Result<bool>;

    /// Deletes the listed fields. Missing fields are ignored; calling this
    /// twice with the same arguments leaves the store as one call would.
    async fn release(&self, event_id: i64, fields: &[String]) -> Result<()>;

    /// Fields whose claim timestamp is older than `now_ms - threshold_ms`.
    async fn scan_stale(
        &self,
        event_id: i64,
        threshold_ms: u64,
        now_ms: u64,
    ) -> Result<Vec<String>>;

    /// Reachability probe for the readiness endpoint.
    async fn ping(&self) -> Result<()>;
}

/// Lock-store hash key for an event's claimed seats.
pub fn seats_key(event_id: i64) -> String {
    format!("event:{event_id}:seats")
}
