//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL with `302 Found`.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Resolution (cache lookup, store check, usage count) happens in
/// [`crate::application::services::LinkService::resolve`].
///
/// # Errors
///
/// - 404 Not Found if the code is unknown or deleted
/// - 410 Gone if the link has expired
/// - 503 Service Unavailable if the database does not answer
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let resolution = state.link_service.resolve(&code).await?;

    let location = HeaderValue::try_from(resolution.original_url.as_str()).map_err(|_| {
        AppError::internal(
            "Stored URL is not a valid Location header",
            json!({ "code": code }),
        )
    })?;

    debug!(
        code = %code,
        usage_count = resolution.usage_count,
        "Redirecting"
    );

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}
