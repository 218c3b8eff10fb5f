//! Process-local cache backed by a concurrent hash map.

use super::service::{CacheResult, CacheService};
use crate::utils::clock::{Clock, SystemClock};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Minimum spacing between full sweeps of expired entries, in seconds.
const SWEEP_INTERVAL_SECS: i64 = 60;

fn sweep_interval() -> chrono::Duration {
    chrono::Duration::seconds(SWEEP_INTERVAL_SECS)
}

#[derive(Debug, Clone)]
enum Value {
    Url(String),
    Counter(u64),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: DateTime<Utc>,
}

impl Slot {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// In-memory [`CacheService`] with per-entry expiry.
///
/// Used when Redis is not configured, and in tests together with
/// [`crate::utils::clock::ManualClock`] to drive TTLs deterministically.
/// Expired entries are dropped on access, and every write sweeps the whole
/// map at most once a minute, so keys that are never touched
/// again (idle clients, unresolved links) do not accumulate.
///
/// Counter increments run under the map's shard lock for the key, which
/// gives the same atomicity as Redis `MULTI`/`EXEC`. The state is not shared
/// between processes, so limits are per instance.
pub struct MemoryCache {
    entries: DashMap<String, Slot>,
    clock: Arc<dyn Clock>,
    /// Unix millis at or after which the next write triggers a sweep.
    next_sweep: AtomicI64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        debug!("Using in-process MemoryCache");
        let next_sweep = AtomicI64::new((clock.now() + sweep_interval()).timestamp_millis());
        Self {
            entries: DashMap::new(),
            clock,
            next_sweep,
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.is_live(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    /// Runs [`Self::purge_expired`] if the sweep interval has elapsed.
    ///
    /// Must not be called while holding a reference into `entries`.
    fn maybe_sweep(&self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let due = self.next_sweep.load(Ordering::Relaxed);
        if now_ms < due {
            return;
        }

        let next = (now + sweep_interval()).timestamp_millis();
        if self
            .next_sweep
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.purge_expired();
        }
    }

    fn url_key(short_code: &str) -> String {
        format!("url:{short_code}")
    }

    fn counter_key(key: &str) -> String {
        format!("rate_limit:{key}")
    }

    fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn live_slot(&self, key: &str) -> Option<Slot> {
        let now = self.clock.now();
        let slot = self.entries.get(key)?.clone();
        if slot.is_live(now) {
            Some(slot)
        } else {
            self.entries.remove_if(key, |_, s| !s.is_live(now));
            None
        }
    }

    /// Remaining lifetime of a cached URL entry.
    pub fn url_ttl(&self, short_code: &str) -> Option<Duration> {
        let now = self.clock.now();
        self.live_slot(&Self::url_key(short_code))
            .and_then(|slot| (slot.expires_at - now).to_std().ok())
    }

    /// Number of stored entries, including not-yet-collected expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let url = match self.live_slot(&Self::url_key(short_code)) {
            Some(Slot {
                value: Value::Url(url),
                ..
            }) => Some(url),
            _ => None,
        };

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
        if ttl.is_zero() {
            return Ok(());
        }

        let now = self.clock.now();
        self.maybe_sweep(now);

        let expires_at = Self::expiry(now, ttl);
        self.entries.insert(
            Self::url_key(short_code),
            Slot {
                value: Value::Url(original_url.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        if self.entries.remove(&Self::url_key(short_code)).is_some() {
            debug!("Cache INVALIDATE: {}", short_code);
        }
        Ok(())
    }

    async fn get_counter(&self, key: &str) -> CacheResult<u64> {
        Ok(match self.live_slot(&Self::counter_key(key)) {
            Some(Slot {
                value: Value::Counter(count),
                ..
            }) => count,
            _ => 0,
        })
    }

    async fn increment_counter(&self, key: &str, window: Duration) -> CacheResult<u64> {
        let now = self.clock.now();
        self.maybe_sweep(now);

        let fresh = Slot {
            value: Value::Counter(1),
            expires_at: Self::expiry(now, window),
        };

        let count = match self.entries.entry(Self::counter_key(key)) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                if slot.is_live(now)
                    && let Value::Counter(count) = &mut slot.value
                {
                    *count += 1;
                    *count
                } else {
                    *slot = fresh;
                    1
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                1
            }
        };

        Ok(count)
    }

    async fn counter_ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let now = self.clock.now();
        Ok(self
            .live_slot(&Self::counter_key(key))
            .and_then(|slot| (slot.expires_at - now).to_std().ok()))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ManualClock;

    fn cache_with_clock() -> (MemoryCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (MemoryCache::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_url_roundtrip_and_expiry() {
        let (cache, clock) = cache_with_clock();

        cache
            .set_url("abc", "https://example.com", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(
            cache.get_url("abc").await.unwrap().as_deref(),
            Some("https://example.com")
        );
        assert_eq!(cache.url_ttl("abc"), Some(Duration::from_secs(10)));

        clock.advance(chrono::Duration::seconds(10));
        assert_eq!(cache.get_url("abc").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (cache, _clock) = cache_with_clock();

        cache
            .set_url("abc", "https://example.com", Duration::from_secs(10))
            .await
            .unwrap();
        cache.invalidate("abc").await.unwrap();

        assert_eq!(cache.get_url("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_is_not_stored() {
        let (cache, _clock) = cache_with_clock();

        cache
            .set_url("abc", "https://example.com", Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(cache.get_url("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_counter_window_is_fixed_to_first_increment() {
        let (cache, clock) = cache_with_clock();
        let window = Duration::from_secs(60);

        assert_eq!(cache.increment_counter("ip", window).await.unwrap(), 1);
        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(cache.increment_counter("ip", window).await.unwrap(), 2);

        // Second increment must not extend the window.
        assert_eq!(
            cache.counter_ttl("ip").await.unwrap(),
            Some(Duration::from_secs(30))
        );

        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(cache.get_counter("ip").await.unwrap(), 0);
        assert_eq!(cache.increment_counter("ip", window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counters_and_urls_do_not_collide() {
        let (cache, _clock) = cache_with_clock();

        cache
            .set_url("same", "https://example.com", Duration::from_secs(10))
            .await
            .unwrap();
        cache
            .increment_counter("same", Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(cache.get_counter("same").await.unwrap(), 1);
        assert!(cache.get_url("same").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let cache = Arc::new(MemoryCache::new());
        let window = Duration::from_secs(60);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.increment_counter("ip", window).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.get_counter("ip").await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_idle_counters_are_swept_after_their_window() {
        let (cache, clock) = cache_with_clock();
        let window = Duration::from_secs(60);

        for i in 0..1000 {
            cache
                .increment_counter(&format!("10.0.{}.{}", i / 256, i % 256), window)
                .await
                .unwrap();
        }
        cache
            .set_url("idle", "https://example.com", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1001);

        clock.advance(chrono::Duration::hours(48));
        for i in 0..10 {
            cache
                .increment_counter(&format!("192.0.2.{i}"), window)
                .await
                .unwrap();
        }

        assert_eq!(cache.len(), 10);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_entries() {
        let (cache, clock) = cache_with_clock();

        cache
            .increment_counter("short", Duration::from_secs(30))
            .await
            .unwrap();
        cache
            .set_url("long", "https://example.com", Duration::from_secs(3600))
            .await
            .unwrap();

        clock.advance(chrono::Duration::seconds(90));
        assert_eq!(cache.purge_expired(), 1);

        assert_eq!(cache.len(), 1);
        assert!(cache.get_url("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_runs_at_most_once_per_interval() {
        let (cache, clock) = cache_with_clock();

        cache
            .increment_counter("a", Duration::from_secs(1))
            .await
            .unwrap();
        clock.advance(chrono::Duration::seconds(5));

        // Interval not yet elapsed: the expired counter is still stored.
        cache
            .increment_counter("b", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);

        clock.advance(sweep_interval());
        cache
            .increment_counter("c", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
    }
}
