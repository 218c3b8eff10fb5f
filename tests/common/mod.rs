#![allow(dead_code)]

use axum::extract::ConnectInfo;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tinylink::application::services::{LinkService, LinkSettings, RateLimiter};
use tinylink::infrastructure::cache::{CacheService, MemoryCache};
use tinylink::infrastructure::persistence::PgLinkRepository;
use tinylink::state::AppState;
use tinylink::utils::clock::ManualClock;
use tower::Layer;

pub const BASE_URL: &str = "http://localhost:3000";

/// State wired to the test database, an in-memory cache and a manual clock.
pub struct TestContext {
    pub state: AppState,
    pub cache: Arc<MemoryCache>,
    pub clock: Arc<ManualClock>,
}

pub fn create_test_context(pool: PgPool) -> TestContext {
    create_test_context_with_limit(pool, 1_000)
}

pub fn create_test_context_with_limit(pool: PgPool, limit: u64) -> TestContext {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = Arc::new(MemoryCache::with_clock(clock.clone()));
    let shared: Arc<dyn CacheService> = cache.clone();

    let link_repo = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    let link_service = Arc::new(
        LinkService::new(link_repo, shared.clone(), LinkSettings::default())
            .with_clock(clock.clone()),
    );
    let rate_limiter = Arc::new(RateLimiter::new(
        shared.clone(),
        limit,
        std::time::Duration::from_secs(60),
    ));

    TestContext {
        state: AppState::new(link_service, rate_limiter, shared, BASE_URL, true),
        cache,
        clock,
    }
}

pub async fn create_test_link(pool: &PgPool, code: &str, url: &str) {
    create_link_expiring(pool, code, url, Utc::now() + Duration::hours(24)).await;
}

pub async fn create_link_expiring(pool: &PgPool, code: &str, url: &str, expires_at: DateTime<Utc>) {
    sqlx::query("INSERT INTO links (code, original_url, expires_at) VALUES ($1, $2, $3)")
        .bind(code)
        .bind(url)
        .bind(expires_at)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn create_deleted_link(pool: &PgPool, code: &str, url: &str) {
    sqlx::query(
        "INSERT INTO links (code, original_url, expires_at, deleted_at) \
         VALUES ($1, $2, NOW() + INTERVAL '1 day', NOW())",
    )
    .bind(code)
    .bind(url)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn usage_count(pool: &PgPool, code: &str) -> i64 {
    sqlx::query_scalar("SELECT usage_count FROM links WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Injects a fixed peer address, standing in for `into_make_service_with_connect_info`.
#[derive(Clone)]
pub struct MockConnectInfoLayer(pub SocketAddr);

impl Default for MockConnectInfoLayer {
    fn default() -> Self {
        Self("127.0.0.1:12345".parse().unwrap())
    }
}

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.0,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}
