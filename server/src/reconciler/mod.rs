//! Background sweeper that releases stale seat claims.
//!
//! A claim is a *ghost* when it is older than the stale threshold and its
//! seat is still AVAILABLE in the seat store: whoever claimed it provably
//! terminated without committing. Ghosts are released so the seats can be
//! sold; claims backing BOOKED seats are never touched, so the sweeper
//! cannot cause a double booking. It never writes to the seat store.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::lockstore::SeatLockStore;
use crate::logger::warn_if_slow;
use crate::metrics::counters::Counters;
use crate::seat::model::SeatRef;
use crate::seat::repository::SeatRepository;
use crate::time::now_ms;

pub struct Reconciler {
    repo: Arc<dyn SeatRepository>,
    locks: Arc<dyn SeatLockStore>,
    /// Claims younger than this may belong to in-flight bookings and are
    /// left alone. Must exceed worst-case commit + compensation latency.
    stale_threshold: Duration,
    counters: Counters,
}

impl Reconciler {
    pub fn new(
        repo: Arc<dyn SeatRepository>,
        locks: Arc<dyn SeatLockStore>,
        stale_threshold: Duration,
        counters: Counters,
    ) -> Self {
        Self {
            repo,
            locks,
            stale_threshold,
            counters,
        }
    }

    /// Runs the sweep loop until the process exits.
    pub fn spawn(self: Arc<Self>, sweep_interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            // First tick fires immediately; skip it so a fresh start does
            // not race bookings that are mid-flight during boot.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep().await {
                    tracing::error!(error = ?e, "reconciler sweep failed");
                }
            }
        })
    }

    /// One pass over every known event. Per-event failures are logged and
    /// the sweep moves on; the next interval retries naturally.
    #[instrument(target = "reconciler", skip(self))]
    pub async fn sweep(&self) -> Result<u64> {
        self.counters
            .reconciler_sweeps
            .fetch_add(1, Ordering::Relaxed);

        let mut released_total = 0u64;

        for event_id in self.repo.list_event_ids().await? {
            match self.sweep_event(event_id).await {
                Ok(released) => released_total += released,
                Err(e) => {
                    warn!(event_id, error = %e, "event sweep failed; continuing");
                }
            }
        }

        if released_total > 0 {
            info!(released = released_total, "reconciler released ghost claims");
        }

        Ok(released_total)
    }

    async fn sweep_event(&self, event_id: i64) -> Result<u64> {
        let threshold_ms = self.stale_threshold.as_millis() as u64;
        let stale = self
            .locks
            .scan_stale(event_id, threshold_ms, now_ms())
            .await?;

        if stale.is_empty() {
            return Ok(0);
        }

        let available: HashSet<String> = warn_if_slow(
            "reconciler_fetch_available",
            event_id,
            Duration::from_millis(200),
            self.repo.fetch_available(event_id),
        )
        .await?
        .iter()
        .map(SeatRef::lock_field)
        .collect();

        let ghosts = ghost_fields(&stale, &available);
        if ghosts.is_empty() {
            debug!(event_id, stale = stale.len(), "stale claims all back BOOKED seats");
            return Ok(0);
        }

        self.locks.release(event_id, &ghosts).await?;

        self.counters
            .reconciler_ghosts_released
            .fetch_add(ghosts.len() as u64, Ordering::Relaxed);
        info!(event_id, ghosts = ghosts.len(), "released stale claims");

        Ok(ghosts.len() as u64)
    }
}

/// Stale claims whose seats the seat store still shows as AVAILABLE.
fn ghost_fields(stale: &[String], available: &HashSet<String>) -> Vec<String> {
    stale
        .iter()
        .filter(|f| available.contains(*f))
        .cloned()
        .collect()
}
