/// Redis wrapper with graceful degradation.
///
/// Every operation swallows Redis errors after logging a warning and reports a miss
/// (`None` / `false`). Callers fall through to computing the value themselves, so the
/// service is fully functional without Redis.
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

#[derive(Clone)]
pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// `None` or an unparsable URL yields a cache that never stores anything.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "failed to create redis client, cache disabled"))
                .ok()
        });
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Sends a PING. `false` when unconfigured or unreachable.
    pub async fn is_available(&self) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()
            .flatten()
    }

    /// Stores `value` under `key` expiring after `ttl_secs`. Returns `true` on success.
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    async fn connection(&self) -> Option<MultiplexedConnection> {
        let client = self.client.as_ref()?;
        client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .ok()
    }
}
