use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the process-wide subscriber. Dependencies log at `info`;
/// the booking pipeline itself defaults to `debug` so a contended flash
/// sale can be traced without redeploying.
pub fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,seatgrid=debug"));

    let base = fmt::layer()
        .with_target(true)
        // Includes timing when the span closes
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.pretty())
            .init();
    }
}

/// Wraps a seat-store or lock-store call and warns when it outlives its
/// latency budget. The event id is part of the record so an on-call
/// reader can tell one hot event from a store-wide slowdown.
pub async fn warn_if_slow<F, T>(op: &'static str, event_id: i64, budget: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > budget {
        tracing::warn!(
            target: "slow_ops",
            op,
            event_id,
            budget_ms = budget.as_millis() as u64,
            elapsed_ms = elapsed.as_millis() as u64,
            "store call exceeded its latency budget"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn warn_if_slow_is_transparent_to_the_result() {
        let fast = warn_if_slow("noop", 1, Duration::from_secs(5), async { 40 + 2 }).await;
        assert_eq!(fast, 42);

        // Blowing the budget only logs; the value still comes through.
        let slow = warn_if_slow("sleep", 1, Duration::from_millis(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            "done"
        })
        .await;
        assert_eq!(slow, "done");
    }
}
