//! Booking admission and commit pipeline.
//!
//! The coordinator turns a flood of concurrent booking requests into
//! at-most-one successful owner per seat:
//!
//! 1. validate and de-duplicate the requested seats;
//! 2. advisory sold-out fast path against the admission cache;
//! 3. gatekeeper claim in the lock store (all seats or none, atomic);
//! 4. authoritative commit through the configured strategy;
//! 5. on commit failure, compensate by releasing the claim.
//!
//! The coordinator holds no per-request state between calls and never
//! retries; losers get a typed conflict and the client decides.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::anyhow;
use tokio::time::timeout;
use tracing::{instrument, warn};

use crate::admission::AdmissionCache;
use crate::booking::strategy::CommitStrategy;
use crate::error::BookingError;
use crate::lockstore::SeatLockStore;
use crate::metrics::counters::Counters;
use crate::seat::model::SeatRef;
use crate::time::now_ms;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingReceipt {
    pub seat_count: usize,
}

/// Stateless request handler for `book_seats`. Safe to share across any
/// number of concurrent callers; all mutable state lives in the stores.
pub struct BookingCoordinator {
    locks: Arc<dyn SeatLockStore>,
    strategy: Arc<dyn CommitStrategy>,
    /// `None` when the admission fast path is disabled by configuration.
    admission: Option<Arc<dyn AdmissionCache>>,
    counters: Counters,
    /// Per-operation deadline for lock store / seat store calls.
    op_deadline: Duration,
}

impl BookingCoordinator {
    pub fn new(
        locks: Arc<dyn SeatLockStore>,
        strategy: Arc<dyn CommitStrategy>,
        admission: Option<Arc<dyn AdmissionCache>>,
        counters: Counters,
        op_deadline: Duration,
    ) -> Self {
        Self {
            locks,
            strategy,
            admission,
            counters,
            op_deadline,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    #[instrument(
        target = "booking",
        skip(self, seats),
        fields(user_id = %user_id, requested = seats.len())
    )]
    pub async fn book_seats(
        &self,
        event_id: i64,
        user_id: &str,
        seats: &[SeatRef],
    ) -> Result<BookingReceipt, BookingError> {
        let seats = normalize_seats(user_id, seats)?;
        self.counters
            .bookings_requested
            .fetch_add(1, Ordering::Relaxed);

        // Advisory fast path: a zero counter is a sufficient sold-out
        // signal. A miss or error skips the check; it proves nothing.
        if let Some(ac) = &self.admission {
            let peek = timeout(self.op_deadline, ac.peek(event_id))
                .await
                .ok()
                .flatten();
            match peek {
                Some(k) if k <= 0 => {
                    self.counters
                        .admission_sold_out
                        .fetch_add(1, Ordering::Relaxed);
                    return Err(BookingError::SoldOut);
                }
                Some(k) if (k as usize) < seats.len() => {
                    self.counters
                        .admission_insufficient
                        .fetch_add(1, Ordering::Relaxed);
                    return Err(BookingError::InsufficientCapacity { available: k });
                }
                _ => {}
            }
        }

        // Claim, commit and compensation run in their own task so that a
        // caller dropped mid-booking (client disconnect, handler timeout)
        // cannot strand a claim without its release attempt.
        let handle = tokio::spawn(claim_and_commit(
            Arc::clone(&self.locks),
            Arc::clone(&self.strategy),
            self.admission.clone(),
            self.counters.clone(),
            self.op_deadline,
            event_id,
            user_id.to_string(),
            seats,
        ));

        match handle.await {
            Ok(res) => res,
            Err(e) => Err(BookingError::Internal(anyhow!(
                "booking task aborted: {e}"
            ))),
        }
    }
}

/// The gatekeeper-to-commit section of the protocol.
///
/// From a successful claim onward this is straight-line code: every failure
/// path performs exactly one release attempt before surfacing its error,
/// and no path skips compensation.
#[allow(clippy::too_many_arguments)]
async fn claim_and_commit(
    locks: Arc<dyn SeatLockStore>,
    strategy: Arc<dyn CommitStrategy>,
    admission: Option<Arc<dyn AdmissionCache>>,
    counters: Counters,
    op_deadline: Duration,
    event_id: i64,
    user_id: String,
    seats: Vec<SeatRef>,
) -> Result<BookingReceipt, BookingError> {
    let fields: Vec<String> = seats.iter().map(SeatRef::lock_field).collect();

    // Gatekeeper. An ambiguous outcome (error, deadline) must never reach
    // the seat store, so both map to UNAVAILABLE here.
    let claimed = match timeout(op_deadline, locks.try_claim(event_id, &fields, now_ms())).await {
        Err(_) => {
            counters.claim_errors.fetch_add(1, Ordering::Relaxed);
            return Err(BookingError::Unavailable(
                "lock store deadline exceeded".into(),
            ));
        }
        Ok(Err(e)) => {
            counters.claim_errors.fetch_add(1, Ordering::Relaxed);
            warn!(event_id, error = %e, "seat claim failed");
            return Err(BookingError::Unavailable(e.to_string()));
        }
        Ok(Ok(claimed)) => claimed,
    };

    if !claimed {
        counters.claim_conflicts.fetch_add(1, Ordering::Relaxed);
        return Err(BookingError::ConflictCached);
    }

    // Authoritative commit, isolated in its own task: a deadline, an error
    // or a panic in the strategy all land in the compensation path below.
    let commit_task = {
        let strategy = Arc::clone(&strategy);
        let user_id = user_id.clone();
        let seats = seats.clone();
        tokio::spawn(async move { strategy.commit(event_id, &user_id, &seats).await })
    };
    let committed = match timeout(op_deadline, commit_task).await {
        Err(_) => Err(BookingError::Unavailable(
            "seat store deadline exceeded".into(),
        )),
        Ok(Err(join_err)) => Err(BookingError::Internal(anyhow!(
            "commit task died: {join_err}"
        ))),
        Ok(Ok(res)) => res,
    };

    match committed {
        Ok(()) => {
            counters.bookings_committed.fetch_add(1, Ordering::Relaxed);

            // The claim entries stay: they now mirror BOOKED rows and the
            // reconciler will never touch them.
            if let Some(ac) = &admission {
                ac.decrement(event_id, seats.len() as i64).await;
            }

            Ok(BookingReceipt {
                seat_count: seats.len(),
            })
        }
        Err(err) => {
            if err.is_conflict() {
                counters.commit_conflicts.fetch_add(1, Ordering::Relaxed);
            } else {
                counters.commit_failures.fetch_add(1, Ordering::Relaxed);
            }

            // Compensation is best-effort: a failed release is logged and
            // left to the reconciler, and never alters the returned error.
            let released = match timeout(op_deadline, locks.release(event_id, &fields)).await {
                Err(_) => Err(anyhow!("release deadline exceeded")),
                Ok(res) => res,
            };
            if let Err(re) = released {
                counters.release_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event_id,
                    error = %re,
                    "compensating release failed; reconciler will collect"
                );
            }

            Err(err)
        }
    }
}

/// Trims labels, drops duplicate `(row, col)` pairs preserving first
/// occurrence, and rejects inputs the protocol cannot work with.
fn normalize_seats(user_id: &str, seats: &[SeatRef]) -> Result<Vec<SeatRef>, BookingError> {
    if user_id.trim().is_empty() {
        return Err(BookingError::Invalid("userId must not be empty".into()));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(seats.len());

    for s in seats {
        let row = s.row.trim();
        let col = s.col.trim();
        if row.is_empty() || col.is_empty() {
            return Err(BookingError::Invalid(
                "seat row and col must not be blank".into(),
            ));
        }

        let seat = SeatRef::new(row, col);
        if seen.insert(seat.clone()) {
            out.push(seat);
        }
    }

    if out.is_empty() {
        return Err(BookingError::Invalid(
            "at least one seat is required".into(),
        ));
    }

    Ok(out)
}
