use anyhow::Result;
use async_trait::async_trait;

use crate::seat::model::{Event, Seat, SeatRef};

/// Read/insert surface of the authoritative seat store.
///
/// Authoritative mutation of `status`/`holder` does not go through this
/// trait; each commit strategy owns its own transaction against the pool.
#[async_trait]
pub trait SeatRepository: Send + Sync {
    async fn fetch_event(&self, event_id: i64) -> Result<Option<Event>>;

    /// Returns only the rows that exist; callers treat missing refs as
    /// non-existent seats.
    async fn fetch_seats(&self, event_id: i64, refs: &[SeatRef]) -> Result<Vec<Seat>>;

    async fn fetch_all_seats(&self, event_id: i64) -> Result<Vec<Seat>>;

    /// Coordinates of every seat still AVAILABLE. Used by the reconciler.
    async fn fetch_available(&self, event_id: i64) -> Result<Vec<SeatRef>>;

    async fn list_event_ids(&self) -> Result<Vec<i64>>;

    /// Inserts the event and its full `rows x cols` seat grid in one
    /// transaction. All seats start AVAILABLE with no holder.
    async fn insert_event_with_seats(&self, event: &Event) -> Result<()>;
}
