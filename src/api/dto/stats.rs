//! DTOs for the per-link statistics endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::LinkStats;

/// Usage statistics for a single link.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub code: String,
    pub short_url: String,
    pub original_url: String,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Whether `expires_at` has passed; expired links still report stats.
    pub expired: bool,
}

impl StatsResponse {
    pub fn new(stats: LinkStats, short_url: String, now: DateTime<Utc>) -> Self {
        Self {
            expired: now > stats.expires_at,
            code: stats.code,
            short_url,
            original_url: stats.original_url,
            usage_count: stats.usage_count,
            created_at: stats.created_at,
            expires_at: stats.expires_at,
        }
    }
}
