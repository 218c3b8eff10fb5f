//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{LinkService, RateLimiter};
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::persistence::PgLinkRepository;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<PgLinkRepository>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub cache: Arc<dyn CacheService>,
    pub base_url: String,
    /// Read client IPs from forwarding headers. See [`crate::utils::client_ip`].
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService<PgLinkRepository>>,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<dyn CacheService>,
        base_url: impl Into<String>,
        behind_proxy: bool,
    ) -> Self {
        Self {
            link_service,
            rate_limiter,
            cache,
            base_url: base_url.into(),
            behind_proxy,
        }
    }

    pub fn short_url(&self, code: &str) -> String {
        self.link_service.get_short_url(&self.base_url, code)
    }
}
