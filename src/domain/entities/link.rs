//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A persisted short code → original URL record.
///
/// `code` is immutable once assigned. After creation the only mutations are
/// `usage_count` increments and setting `deleted_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub usage_count: i64,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Returns true if the link has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if `now` is past the link's expiry.
    ///
    /// A link is still valid at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time left until expiry, or `None` once the link has expired.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<Duration> {
        let remaining = self.expires_at - now;
        (remaining > Duration::zero()).then_some(remaining)
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            code: self.code.clone(),
            original_url: self.original_url.clone(),
            usage_count: self.usage_count,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewLink {
    /// Builds a record that expires `ttl` after `now`.
    pub fn new(code: String, original_url: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            code,
            original_url,
            created_at: now,
            expires_at: now + ttl,
        }
    }
}

/// Usage metadata for a single link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub code: String,
    pub original_url: String,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
