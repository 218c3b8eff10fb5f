//! Handler for link shortening endpoint.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::shorten::{LinkResponse, ShortenRequest};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link, or returns the live one already pointing at the URL.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// { "original_url": "https://example.com" }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for a missing, empty or non-HTTP(S) URL.
/// Returns 429 Too Many Requests when the client's quota is used up.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_short_link(&payload.original_url)
        .await?;

    let short_url = state.short_url(&link.code);
    Ok(Json(LinkResponse::from_link(link, short_url)))
}
