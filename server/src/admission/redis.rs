use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{AdmissionCache, available_key};

/// Redis-backed admission counter. Shares the lock store's connection
/// multiplexer; all failures degrade to "no hint".
#[derive(Clone)]
pub struct RedisAdmissionCache {
    conn: ConnectionManager,
}

impl RedisAdmissionCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl AdmissionCache for RedisAdmissionCache {
    async fn peek(&self, event_id: i64) -> Option<i64> {
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<i64>>(available_key(event_id)).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(event_id, error = %e, "admission peek failed; skipping fast path");
                None
            }
        }
    }

    async fn decrement(&self, event_id: i64, by: i64) {
        let mut conn = self.conn.clone();
        let key = available_key(event_id);

        let after: i64 = match conn.decr(&key, by).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(event_id, error = %e, "admission decrement failed");
                return;
            }
        };

        if after < 0 {
            // The counter is a lower-bounded hint; clamp and record the
            // anomaly. KEEPTTL so the key still expires with the event.
            tracing::warn!(event_id, after, "admission counter went negative; clamping to 0");
            let clamp: Result<(), _> = redis::cmd("SET")
                .arg(&key)
                .arg(0)
                .arg("KEEPTTL")
                .query_async(&mut conn)
                .await;
            if let Err(e) = clamp {
                tracing::warn!(event_id, error = %e, "admission clamp failed");
            }
        }
    }

    async fn seed(&self, event_id: i64, initial: i64, ttl_secs: u64) {
        let mut conn = self.conn.clone();

        if let Err(e) = conn
            .set_ex::<_, _, ()>(available_key(event_id), initial, ttl_secs)
            .await
        {
            tracing::warn!(event_id, error = %e, "admission seed failed");
        }
    }
}
