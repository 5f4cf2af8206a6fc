use std::sync::Arc;

use seatgrid::{
    admission::{AdmissionCache, CountedAdmissionCache, RedisAdmissionCache},
    api::{AppState, build_router},
    booking::{coordinator::BookingCoordinator, strategy},
    config::AppConfig,
    db::Db,
    event::EventService,
    lockstore::{RedisSeatLockStore, SeatLockStore},
    logger::init_tracing,
    metrics::counters::Counters,
    reconciler::Reconciler,
    seat::repository::SeatRepository,
    seat::repository_sqlx::SqlxSeatRepository,
};

/// Connects the seat store, runs migrations and hands back the repository
/// plus the raw pool (the commit strategies transact on the pool directly).
async fn init_seat_store(cfg: &AppConfig) -> anyhow::Result<(Arc<SqlxSeatRepository>, sqlx::AnyPool)> {
    let db = Db::connect(&cfg.database_url, cfg.db_max_connections).await?;
    db.migrate().await?;

    let pool = db.pool.clone();
    Ok((Arc::new(SqlxSeatRepository::new(db.pool)), pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("Starting SeatGrid server...");

    let cfg = AppConfig::from_env();
    let counters = Counters::default();

    let (repo, pool) = init_seat_store(&cfg).await?;
    let repo: Arc<dyn SeatRepository> = repo;

    // One multiplexer per process; the lock store and the admission cache
    // share it via cheap clones.
    let redis_client = redis::Client::open(cfg.redis_url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    let lock_ttl_secs = cfg.lock_ttl.as_secs();
    let locks: Arc<dyn SeatLockStore> =
        Arc::new(RedisSeatLockStore::new(redis_conn.clone(), lock_ttl_secs));

    let admission: Option<Arc<dyn AdmissionCache>> = if cfg.admission_cache_enabled {
        Some(Arc::new(CountedAdmissionCache::new(
            Arc::new(RedisAdmissionCache::new(redis_conn)),
            counters.clone(),
        )))
    } else {
        tracing::warn!("admission cache disabled; every request goes to the gatekeeper");
        None
    };

    let strategy = strategy::build(&cfg.booking_strategy, &pool);
    tracing::info!(strategy = strategy.name(), "commit strategy selected");

    let coordinator = Arc::new(BookingCoordinator::new(
        Arc::clone(&locks),
        strategy,
        admission.clone(),
        counters.clone(),
        cfg.op_deadline,
    ));

    let events = Arc::new(EventService::new(
        Arc::clone(&repo),
        admission,
        lock_ttl_secs,
    ));

    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&repo),
        Arc::clone(&locks),
        cfg.stale_threshold,
        counters.clone(),
    ));
    let _sweeper = reconciler.spawn(cfg.sweep_interval);

    let router = build_router(AppState {
        coordinator,
        events,
        repo,
        locks,
    });

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "SeatGrid listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
