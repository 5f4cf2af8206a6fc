use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Seat store connection string (Postgres in production; the sqlx Any
    /// driver also accepts sqlite URLs for local runs and tests).
    pub database_url: String,

    /// Lock store connection string. One connection multiplexer is created
    /// per process and cloned per call.
    pub redis_url: String,

    /// HTTP listen address.
    pub bind_addr: String,

    // =========================
    // Booking configuration
    // =========================
    /// Authoritative-commit strategy: `naive`, `pessimistic` or `optimistic`.
    ///
    /// This is a performance knob, not a correctness one: the gatekeeper
    /// admits at most one coordinator per seat regardless of the strategy,
    /// so swapping it only changes the error distribution and latency
    /// profile under contention.
    pub booking_strategy: String,

    /// Enables the advisory sold-out fast path. When false, every request
    /// goes straight to the gatekeeper.
    pub admission_cache_enabled: bool,

    /// Deadline applied to each individual seat-store / lock-store /
    /// admission-cache call. A hit deadline counts as that operation
    /// failing; there are no in-core retries.
    pub op_deadline: Duration,

    // =========================
    // Reconciler configuration
    // =========================
    /// Cadence of the background sweep that releases stale claims.
    pub sweep_interval: Duration,

    /// Claims older than this are sweep candidates. Must exceed the
    /// worst-case commit + compensation latency, otherwise the sweeper can
    /// release a claim that an in-flight booking still owns.
    pub stale_threshold: Duration,

    /// Key-level TTL attached to per-event lock-store keys. Covers the
    /// event duration plus grace; the reconciler governs staleness at finer
    /// granularity.
    pub lock_ttl: Duration,

    // =========================
    // Pool sizing
    // =========================
    /// Seat store pool size. Bounds the number of in-flight authoritative
    /// commits; the gatekeeper rejects losers before they reach the pool.
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://seatgrid_dev.db".to_string());
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let booking_strategy =
            std::env::var("BOOKING_STRATEGY").unwrap_or_else(|_| "optimistic".to_string());

        Self {
            database_url,
            redis_url,
            bind_addr,
            booking_strategy,
            admission_cache_enabled: env_parse("ADMISSION_CACHE_ENABLED", true),
            op_deadline: Duration::from_millis(env_parse("OP_DEADLINE_MS", 2_000)),
            sweep_interval: Duration::from_secs(env_parse("RECONCILER_SWEEP_INTERVAL_SECS", 60)),
            stale_threshold: Duration::from_secs(env_parse("RECONCILER_STALE_THRESHOLD_SECS", 30)),
            lock_ttl: Duration::from_secs(env_parse::<u64>("LOCKSTORE_TTL_HOURS", 24) * 3_600),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 16),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
