//! API route configuration.

use crate::api::handlers::{
    delete_link_handler, list_links_handler, redirect_handler, shorten_handler, stats_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes that count against the client's request quota.
///
/// # Endpoints
///
/// - `POST /shorten` - Create a short link
/// - `GET  /{code}`  - Redirect to the original URL
pub fn limited_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/{code}", get(redirect_handler))
}

/// Management routes, not rate limited.
///
/// # Endpoints
///
/// - `GET    /`             - List links (`?include_deleted=true`)
/// - `GET    /stats/{code}` - Usage statistics for a link
/// - `DELETE /{code}`       - Soft-delete a link
pub fn management_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_links_handler))
        .route("/stats/{code}", get(stats_handler))
        .route("/{code}", axum::routing::delete(delete_link_handler))
}
