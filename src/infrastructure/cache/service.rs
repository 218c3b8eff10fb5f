//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation error: {0}")]
    Operation(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
            Self::Connection(e.to_string())
        } else {
            Self::Operation(e.to_string())
        }
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Volatile, TTL-bounded key/value substrate.
///
/// Holds two kinds of entries: `code → original_url` mirrors used by the link
/// service, and per-client request counters used by the rate limiter.
/// Implementations report failures as [`CacheError`]; deciding whether to
/// degrade or fail closed is left to the caller.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed, shared across instances
/// - [`crate::infrastructure::cache::MemoryCache`] - Process-local fallback and test double
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached original URL for a short code.
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores a URL mapping that expires after `ttl`.
    async fn set_url(&self, short_code: &str, original_url: &str, ttl: Duration)
    -> CacheResult<()>;

    /// Removes a cached URL mapping.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Reads a counter; a missing or expired counter reads as zero.
    async fn get_counter(&self, key: &str) -> CacheResult<u64>;

    /// Atomically increments a counter and returns the new value.
    ///
    /// A counter created by this call expires after `window`. The increment
    /// and the expiry are applied as one unit, so a counter can never exist
    /// without an expiry. An existing counter keeps its original expiry.
    async fn increment_counter(&self, key: &str, window: Duration) -> CacheResult<u64>;

    /// Remaining lifetime of a counter, if it exists and has an expiry.
    async fn counter_ttl(&self, key: &str) -> CacheResult<Option<Duration>>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Short backend name for health reporting.
    fn backend_name(&self) -> &'static str;
}
