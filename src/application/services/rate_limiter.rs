//! Fixed-window request limiter backed by the cache counters.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde_json::json;
use tracing::{debug, error};

use crate::error::AppError;
use crate::infrastructure::cache::{CacheError, CacheResult, CacheService};

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request was counted.
    Allowed { count: u64, remaining: u64 },
    /// The client used up its window; `retry_after` is the time until the
    /// window closes, when known.
    Throttled { retry_after: Option<Duration> },
}

/// Per-client fixed-window limiter.
///
/// A client may make `limit` requests per `window`. The window opens with the
/// client's first counted request and is not extended by later ones.
///
/// # Failure Mode
///
/// Fails closed: if the counter store errors or times out, the check returns
/// [`AppError::DependencyUnavailable`] and the request is rejected.
///
/// # Example
///
/// ```rust,ignore
/// let limiter = RateLimiter::new(cache, 5, Duration::from_secs(60));
///
/// match limiter.check("203.0.113.7").await? {
///     RateDecision::Allowed { remaining, .. } => debug!(remaining, "allowed"),
///     RateDecision::Throttled { .. } => return Err(/* 429 */),
/// }
/// ```
pub struct RateLimiter {
    cache: Arc<dyn CacheService>,
    limit: u64,
    window: Duration,
    timeout: Duration,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn CacheService>, limit: u64, window: Duration) -> Self {
        Self {
            cache,
            limit,
            window,
            timeout: Duration::from_millis(250),
        }
    }

    /// Bounds each counter call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts a request from `client_key` if it is within the limit.
    ///
    /// A client already at the limit is throttled without touching the
    /// counter. Otherwise the counter is incremented atomically; if
    /// concurrent requests pushed it past the limit in the meantime, this
    /// request is throttled too.
    pub async fn check(&self, client_key: &str) -> Result<RateDecision, AppError> {
        let count = self
            .call("get_counter", self.cache.get_counter(client_key))
            .await?;

        if count >= self.limit {
            return Ok(self.throttle(client_key).await);
        }

        let count = self
            .call(
                "increment_counter",
                self.cache.increment_counter(client_key, self.window),
            )
            .await?;

        if count > self.limit {
            return Ok(self.throttle(client_key).await);
        }

        debug!(client = client_key, count, limit = self.limit, "Request counted");

        Ok(RateDecision::Allowed {
            count,
            remaining: self.limit - count,
        })
    }

    /// Like [`Self::check`], but maps a throttled decision to
    /// [`AppError::RateLimited`].
    pub async fn enforce(&self, client_key: &str) -> Result<(), AppError> {
        match self.check(client_key).await? {
            RateDecision::Allowed { .. } => Ok(()),
            RateDecision::Throttled { retry_after } => Err(AppError::rate_limited(
                "Rate limit exceeded",
                Some(retry_after_secs(retry_after.unwrap_or(self.window))),
            )),
        }
    }

    async fn throttle(&self, client_key: &str) -> RateDecision {
        counter!("rate_limited_total").increment(1);
        debug!(client = client_key, limit = self.limit, "Request throttled");

        // Already rejecting; a missing TTL only loses the Retry-After hint.
        let retry_after = self
            .call("counter_ttl", self.cache.counter_ttl(client_key))
            .await
            .ok()
            .flatten();

        RateDecision::Throttled { retry_after }
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = CacheResult<T>>,
    ) -> Result<T, AppError> {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        };

        result.map_err(|e| {
            counter!("cache_errors_total").increment(1);
            error!(operation, error = %e, "Rate limiter backend failed, rejecting request");
            AppError::unavailable(
                "Rate limiter unavailable",
                json!({ "operation": operation }),
            )
        })
    }
}

/// Whole seconds to advertise in `Retry-After`, never zero.
fn retry_after_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.max(1)
}
