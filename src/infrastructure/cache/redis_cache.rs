//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

const URL_PREFIX: &str = "url:";
const COUNTER_PREFIX: &str = "rate_limit:";

/// Redis cache implementation for URL lookups and rate-limit counters.
///
/// Uses `ConnectionManager` for automatic reconnection and connection reuse.
/// Errors are returned to the caller rather than swallowed here.
pub struct RedisCache {
    client: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {e}")))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {e}")))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {e}")))?;

        info!("✓ Connected to Redis");

        Ok(Self { client: manager })
    }

    fn url_key(short_code: &str) -> String {
        format!("{URL_PREFIX}{short_code}")
    }

    fn counter_key(key: &str) -> String {
        format!("{COUNTER_PREFIX}{key}")
    }
}

/// Counter windows round up to whole seconds so a sub-second window still
/// gets an expiry.
fn window_seconds(window: Duration) -> u64 {
    let secs = window.as_secs();
    if window.subsec_nanos() > 0 { secs + 1 } else { secs.max(1) }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();
        let url: Option<String> = conn.get(Self::url_key(short_code)).await?;

        match &url {
            Some(url) => debug!("Cache HIT: {} -> {}", short_code, url),
            None => debug!("Cache MISS: {}", short_code),
        }

        Ok(url)
    }

    async fn set_url(
        &self,
        short_code: &str,
        original_url: &str,
        ttl: Duration,
    ) -> CacheResult<()> {
        // URL entries round down: an entry may expire early, never late.
        let seconds = ttl.as_secs();
        if seconds == 0 {
            debug!("Cache SET skipped for {}: TTL under one second", short_code);
            return Ok(());
        }

        let mut conn = self.client.clone();
        conn.set_ex::<_, _, ()>(Self::url_key(short_code), original_url, seconds)
            .await?;

        debug!(
            "Cache SET: {} -> {} (TTL: {}s)",
            short_code, original_url, seconds
        );
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let deleted: i64 = conn.del(Self::url_key(short_code)).await?;

        if deleted > 0 {
            debug!("Cache INVALIDATE: {}", short_code);
        }
        Ok(())
    }

    async fn get_counter(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.client.clone();
        let count: Option<u64> = conn.get(Self::counter_key(key)).await?;
        Ok(count.unwrap_or(0))
    }

    async fn increment_counter(&self, key: &str, window: Duration) -> CacheResult<u64> {
        let key = Self::counter_key(key);
        let mut conn = self.client.clone();

        // MULTI/EXEC: `SET key 0 EX window NX` opens the window only when
        // no counter exists, so later increments never extend it. Plain
        // `SET NX EX` keeps this working on Redis releases without
        // `EXPIRE ... NX` (added in 7.0).
        let window_secs = window_seconds(window);
        let (count, ttl): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(0u64)
            .arg("EX")
            .arg(window_secs)
            .arg("NX")
            .ignore()
            .incr(&key, 1u64)
            .ttl(&key)
            .query_async(&mut conn)
            .await?;

        // The key expired between SET and INCR, so INCR recreated it
        // without a TTL. Start a fresh window rather than count forever.
        if ttl == -1 {
            debug!(key = %key, "Counter lost its expiry, restarting window");
            let _: bool = conn.expire(&key, window_secs as i64).await?;
        }

        Ok(count)
    }

    async fn counter_ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let mut conn = self.client.clone();
        let ttl: i64 = conn.ttl(Self::counter_key(key)).await?;

        // -2: no key, -1: key without expiry
        Ok((ttl >= 0).then(|| Duration::from_secs(ttl as u64)))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_seconds_rounds_up() {
        assert_eq!(window_seconds(Duration::from_secs(60)), 60);
        assert_eq!(window_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(window_seconds(Duration::from_millis(1)), 1);
        assert_eq!(window_seconds(Duration::ZERO), 1);
    }

    #[test]
    fn test_key_namespaces() {
        assert_eq!(RedisCache::url_key("abc123"), "url:abc123");
        assert_eq!(RedisCache::counter_key("10.0.0.1"), "rate_limit:10.0.0.1");
    }

    /// Runs against a live server when `TEST_REDIS_URL` is set.
    async fn test_cache() -> Option<RedisCache> {
        let url = std::env::var("TEST_REDIS_URL").ok()?;
        Some(RedisCache::connect(&url).await.unwrap())
    }

    #[tokio::test]
    async fn test_counter_window_is_fixed_to_first_increment() {
        let Some(cache) = test_cache().await else {
            return;
        };
        let key = format!("test-{}", rand::random::<u64>());
        let window = Duration::from_secs(60);

        assert_eq!(cache.increment_counter(&key, window).await.unwrap(), 1);
        assert_eq!(cache.increment_counter(&key, window).await.unwrap(), 2);
        assert_eq!(cache.get_counter(&key).await.unwrap(), 2);

        let ttl = cache.counter_ttl(&key).await.unwrap().unwrap();
        assert!(ttl <= window && ttl >= Duration::from_secs(58));
    }
}
