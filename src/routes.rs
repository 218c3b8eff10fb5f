//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST   /shorten`      - Create a short link (rate limited)
//! - `GET    /{code}`       - Short link redirect (rate limited)
//! - `GET    /`             - List links
//! - `GET    /stats/{code}` - Link statistics
//! - `DELETE /{code}`       - Soft-delete a link
//! - `GET    /health`       - Health check: database and cache
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-client fixed window, shared through the cache
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// The router without path normalization, for in-process tests.
pub fn router(state: AppState) -> Router {
    let limited = api::routes::limited_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit::layer,
    ));

    Router::new()
        .merge(limited)
        .merge(api::routes::management_routes())
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(tracing::layer())
}
