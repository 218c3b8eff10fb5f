//! Handler for per-link statistics.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns usage statistics for a link.
///
/// # Endpoint
///
/// `GET /stats/{code}`
///
/// Expired links are reported with `"expired": true`; deleted links are 404.
pub async fn stats_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.link_service.get_stats(&code).await?;
    let short_url = state.short_url(&stats.code);

    Ok(Json(StatsResponse::new(stats, short_url, Utc::now())))
}
