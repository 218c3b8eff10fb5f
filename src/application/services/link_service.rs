//! Link creation, resolution and deletion.
//!
//! [`LinkService`] is the cache-aside engine sitting between the durable
//! [`LinkRepository`] and the volatile [`CacheService`]:
//!
//! - the repository is authoritative for existence, deletion and expiry;
//! - the cache only saves a repopulate on the hot path and is never trusted
//!   on its own;
//! - every store call is bounded by a timeout. A store timeout fails the
//!   request, while a cache timeout or error is logged and skipped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::{Link, LinkStats, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::domain::repositories::link_repository::{CODE_CONSTRAINT, ORIGINAL_URL_CONSTRAINT};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheResult, CacheService};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::code_generator::{CodeGenerator, RandomCodeGenerator};
use crate::utils::url_validator::validate_url;

/// Tunables for [`LinkService`].
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Length of generated short codes.
    pub code_length: usize,
    /// Lifetime of a record, fixed at creation.
    pub link_ttl: chrono::Duration,
    /// Inserts attempted before giving up on code collisions.
    pub max_create_attempts: usize,
    pub cache_timeout: Duration,
    pub store_timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            code_length: 6,
            link_ttl: chrono::Duration::hours(24),
            max_create_attempts: 5,
            cache_timeout: Duration::from_millis(250),
            store_timeout: Duration::from_secs(3),
        }
    }
}

/// Outcome of a successful [`LinkService::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub original_url: String,
    /// Usage count after this resolution was recorded.
    pub usage_count: i64,
}

/// Service for creating, resolving and deleting shortened links.
pub struct LinkService<L: LinkRepository> {
    link_repository: Arc<L>,
    cache: Arc<dyn CacheService>,
    generator: Arc<dyn CodeGenerator>,
    clock: Arc<dyn Clock>,
    settings: LinkSettings,
}

impl<L: LinkRepository> LinkService<L> {
    /// Creates a new link service using the system clock and an OS-seeded
    /// code generator.
    pub fn new(link_repository: Arc<L>, cache: Arc<dyn CacheService>, settings: LinkSettings) -> Self {
        Self {
            link_repository,
            cache,
            generator: Arc::new(RandomCodeGenerator::new()),
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    /// Creates a short link, or returns the live link already pointing at
    /// `original_url`.
    ///
    /// # Code Generation
    ///
    /// A fresh code is generated per attempt. A collision on `links_code_key`
    /// regenerates and retries, up to `max_create_attempts` inserts.
    ///
    /// # Concurrent Creates
    ///
    /// The duplicate check and the insert are not atomic. When a concurrent
    /// request inserts the same URL first, the insert here hits
    /// `links_original_url_active_key` and the winner's record is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for empty or non-HTTP(S) URLs.
    /// Returns [`AppError::Internal`] when every attempt collided.
    /// Returns [`AppError::DependencyUnavailable`] if the store times out.
    pub async fn create_short_link(&self, original_url: &str) -> Result<Link, AppError> {
        let original_url = validate_url(original_url).map_err(|e| {
            AppError::bad_request(e.to_string(), json!({ "original_url": original_url }))
        })?;

        if let Some(existing) = self.find_active_by_original_url(&original_url).await? {
            debug!(code = %existing.code, "Returning existing link for URL");
            return Ok(existing);
        }

        let attempts = self.settings.max_create_attempts;
        for attempt in 1..=attempts {
            let now = self.clock.now();
            let new_link = NewLink::new(
                self.generator.generate(self.settings.code_length),
                original_url.clone(),
                now,
                self.settings.link_ttl,
            );

            match self
                .store("create", self.link_repository.create(new_link))
                .await
            {
                Ok(link) => {
                    counter!("links_created_total").increment(1);
                    self.populate_cache(&link, now).await;
                    return Ok(link);
                }
                Err(e) if e.is_conflict_on(CODE_CONSTRAINT) => {
                    warn!(attempt, attempts, "Short code collision, regenerating");
                }
                Err(e) if e.is_conflict_on(ORIGINAL_URL_CONSTRAINT) => {
                    debug!("Lost create race for URL, returning winner");
                    if let Some(winner) = self.find_active_by_original_url(&original_url).await? {
                        return Ok(winner);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions", "attempts": attempts }),
        ))
    }

    /// Resolves a short code to its original URL and records the usage.
    ///
    /// # Request Flow
    ///
    /// 1. Look the code up in the cache
    /// 2. Fetch the durable record regardless of the cache result
    /// 3. Absent or deleted → NotFound; past `expires_at` → Gone
    /// 4. On cache miss, repopulate with the record's remaining lifetime
    /// 5. Increment `usage_count` in place at the store
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`], [`AppError::Gone`], or
    /// [`AppError::DependencyUnavailable`] if the store fails.
    pub async fn resolve(&self, code: &str) -> Result<Resolution, AppError> {
        let cached = self
            .cache_call("get_url", self.cache.get_url(code))
            .await
            .flatten();

        if cached.is_some() {
            counter!("cache_hits_total").increment(1);
        } else {
            counter!("cache_misses_total").increment(1);
        }

        let link = match self
            .store("find_by_code", self.link_repository.find_by_code(code))
            .await?
        {
            Some(link) if !link.is_deleted() => link,
            _ => {
                if cached.is_some() {
                    self.evict(code).await;
                }
                return Err(not_found(code));
            }
        };

        let now = self.clock.now();
        if link.is_expired_at(now) {
            if cached.is_some() {
                self.evict(code).await;
            }
            return Err(AppError::gone(
                "Short link has expired",
                json!({ "code": code, "expired_at": link.expires_at }),
            ));
        }

        let original_url = match cached {
            Some(url) if url == link.original_url => url,
            Some(_) => {
                warn!(code, "Cached URL disagrees with store, refreshing");
                self.populate_cache(&link, now).await;
                link.original_url
            }
            None => {
                self.populate_cache(&link, now).await;
                link.original_url
            }
        };

        // Deleted between the read and the increment.
        let usage_count = self
            .store("increment_usage", self.link_repository.increment_usage(code))
            .await?
            .ok_or_else(|| not_found(code))?;

        counter!("links_resolved_total").increment(1);

        Ok(Resolution {
            original_url,
            usage_count,
        })
    }

    /// Soft-deletes a link and evicts its cache entry.
    ///
    /// Eviction failures are logged only; a stale entry is still rejected by
    /// the store check in [`Self::resolve`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link is absent or already deleted.
    pub async fn delete_link(&self, code: &str) -> Result<(), AppError> {
        let deleted = self
            .store("soft_delete", self.link_repository.soft_delete(code))
            .await?;

        self.evict(code).await;

        if deleted {
            Ok(())
        } else {
            Err(not_found(code))
        }
    }

    /// Returns usage metadata for a non-deleted link. Expired links still
    /// report their stats.
    pub async fn get_stats(&self, code: &str) -> Result<LinkStats, AppError> {
        self.store("find_by_code", self.link_repository.find_by_code(code))
            .await?
            .filter(|link| !link.is_deleted())
            .map(|link| link.stats())
            .ok_or_else(|| not_found(code))
    }

    /// Lists all links, newest first.
    pub async fn list_links(&self, include_deleted: bool) -> Result<Vec<Link>, AppError> {
        self.store("list", self.link_repository.list(include_deleted))
            .await
    }

    /// Checks that the durable store answers within the store timeout.
    pub async fn check_store(&self) -> Result<(), AppError> {
        self.store("ping", self.link_repository.ping()).await
    }

    /// Constructs the public short URL for a code.
    pub fn get_short_url(&self, base_url: &str, code: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), code)
    }

    async fn find_active_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<Link>, AppError> {
        self.store(
            "find_active_by_original_url",
            self.link_repository
                .find_active_by_original_url(original_url),
        )
        .await
    }

    /// Mirrors `link` into the cache for its remaining lifetime, rounded
    /// down to whole seconds.
    async fn populate_cache(&self, link: &Link, now: DateTime<Utc>) {
        let Some(ttl) = cache_ttl(link, now) else {
            return;
        };

        self.cache_call(
            "set_url",
            self.cache.set_url(&link.code, &link.original_url, ttl),
        )
        .await;
    }

    async fn evict(&self, code: &str) {
        self.cache_call("invalidate", self.cache.invalidate(code))
            .await;
    }

    async fn store<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.settings.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::unavailable(
                "Database timed out",
                json!({
                    "operation": operation,
                    "timeout_ms": self.settings.store_timeout.as_millis() as u64,
                }),
            )),
        }
    }

    /// Runs a cache call; errors and timeouts are logged and become `None`.
    async fn cache_call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = CacheResult<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.settings.cache_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                counter!("cache_errors_total").increment(1);
                warn!(operation, error = %e, "Cache operation failed, continuing without cache");
                None
            }
            Err(_) => {
                counter!("cache_errors_total").increment(1);
                warn!(
                    operation,
                    timeout_ms = self.settings.cache_timeout.as_millis() as u64,
                    "Cache operation timed out, continuing without cache"
                );
                None
            }
        }
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}

/// Whole seconds left before `link` expires, or `None` if under a second.
fn cache_ttl(link: &Link, now: DateTime<Utc>) -> Option<Duration> {
    let remaining = link.remaining_ttl(now)?.to_std().ok()?;
    let ttl = Duration::from_secs(remaining.as_secs());
    (!ttl.is_zero()).then_some(ttl)
}
