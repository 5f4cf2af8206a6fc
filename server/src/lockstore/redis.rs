use anyhow::{Context as _, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use super::{SeatLockStore, seats_key};

/// All-or-none claim, executed server-side so no other command on the same
/// key can interleave between the existence checks and the writes.
///
/// KEYS[1] = per-event seats hash
/// ARGV[1] = claim timestamp (epoch ms)
/// ARGV[2] = key TTL in seconds, attached only if the key has none yet
/// ARGV[3..] = seat fields ("row-col")
const TRY_CLAIM_SCRIPT: &str = r#"
local key = KEYS[1]
for i = 3, #ARGV do
  if redis.call('HEXISTS', key, ARGV[i]) == 1 then
    return 0
  end
end
for i = 3, #ARGV do
  redis.call('HSET', key, ARGV[i], ARGV[1])
end
if redis.call('TTL', key) < 0 then
  redis.call('EXPIRE', key, ARGV[2])
end
return 1
"#;

/// Redis-backed seat lock store. One long-lived `ConnectionManager` per
/// process; each call clones it (clones multiplex the same connection).
#[derive(Clone)]
pub struct RedisSeatLockStore {
    conn: ConnectionManager,
    claim_script: Script,
    key_ttl_secs: u64,
}

impl RedisSeatLockStore {
    pub fn new(conn: ConnectionManager, key_ttl_secs: u64) -> Self {
        Self {
            conn,
            claim_script: Script::new(TRY_CLAIM_SCRIPT),
            key_ttl_secs,
        }
    }
}

#[async_trait]
impl SeatLockStore for RedisSeatLockStore {
    async fn try_claim(&self, event_id: i64, fields: &[String], now_ms: u64) -> Result<bool> {
        let mut conn = self.conn.clone();

        let mut invocation = self.claim_script.key(seats_key(event_id));
        invocation.arg(now_ms).arg(self.key_ttl_secs);
        for f in fields {
            invocation.arg(f);
        }

        let claimed: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .context("try_claim script failed")?;

        Ok(claimed == 1)
    }

    async fn release(&self, event_id: i64, fields: &[String]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        let _: () = conn
            .hdel(seats_key(event_id), fields)
            .await
            .context("release failed")?;

        Ok(())
    }

    async fn scan_stale(
        &self,
        event_id: i64,
        threshold_ms: u64,
        now_ms: u64,
    ) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();

        let entries: std::collections::HashMap<String, u64> = conn
            .hgetall(seats_key(event_id))
            .await
            .context("scan_stale failed")?;

        let cutoff = now_ms.saturating_sub(threshold_ms);
        Ok(entries
            .into_iter()
            .filter(|(_, ts)| *ts < cutoff)
            .map(|(field, _)| field)
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("lock store unreachable")?;
        Ok(())
    }
}
