//! DTOs for the link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::Link;

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The URL to shorten. Scheme and host are checked by the link service.
    #[serde(default)]
    #[validate(length(min = 1, message = "Original URL is required"))]
    pub original_url: String,
}

/// A link record as returned by the API.
///
/// ```json
/// {
///   "code": "aZ3kP9",
///   "short_url": "http://localhost:3000/aZ3kP9",
///   "original_url": "https://example.com",
///   "created_at": "2026-01-01T12:00:00Z",
///   "expires_at": "2026-01-02T12:00:00Z",
///   "usage_count": 0,
///   "deleted_at": null
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub usage_count: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LinkResponse {
    pub fn from_link(link: Link, short_url: String) -> Self {
        Self {
            code: link.code,
            short_url,
            original_url: link.original_url,
            created_at: link.created_at,
            expires_at: link.expires_at,
            usage_count: link.usage_count,
            deleted_at: link.deleted_at,
        }
    }
}
