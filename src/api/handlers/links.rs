//! Handlers for link listing and deletion.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::dto::links::{LinkListResponse, ListQuery, MessageResponse};
use crate::api::dto::shorten::LinkResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Lists links, newest first.
///
/// # Endpoint
///
/// `GET /?include_deleted=true`
///
/// Soft-deleted links are omitted unless `include_deleted` is set.
pub async fn list_links_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<LinkListResponse>, AppError> {
    let links = state.link_service.list_links(query.include_deleted).await?;

    let items: Vec<LinkResponse> = links
        .into_iter()
        .map(|link| {
            let short_url = state.short_url(&link.code);
            LinkResponse::from_link(link, short_url)
        })
        .collect();

    Ok(Json(LinkListResponse {
        total: items.len(),
        items,
    }))
}

/// Soft-deletes a link and evicts it from the cache.
///
/// # Endpoint
///
/// `DELETE /{code}`
///
/// # Errors
///
/// Returns 404 Not Found if the link is absent or already deleted.
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    state.link_service.delete_link(&code).await?;

    tracing::info!(code = %code, "Link deleted");

    Ok(Json(MessageResponse::new("URL deleted successfully")))
}
