use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Claim timestamps and staleness math
/// use this exclusively.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

static NEXT_ID: AtomicI64 = AtomicI64::new(0);

/// Process-wide 64-bit id allocator for events and seats.
///
/// Ids are strictly increasing: each call returns `max(prev, now_ms << 12) + 1`,
/// so bursts within one millisecond stay unique and a restarted process resumes
/// above anything it handed out before (provided wall time moved forward).
pub fn next_id() -> i64 {
    let floor = (now_ms() as i64) << 12;
    match NEXT_ID.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
        Some(prev.max(floor) + 1)
    }) {
        Ok(prev) => prev.max(floor) + 1,
        // fetch_update with a Some-returning closure cannot fail.
        Err(prev) => prev.max(floor) + 1,
    }
}
