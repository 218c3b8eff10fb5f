//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Unique constraint on `links.code`.
pub const CODE_CONSTRAINT: &str = "links_code_key";

/// Partial unique index on `links.original_url` among non-deleted rows.
pub const ORIGINAL_URL_CONSTRAINT: &str = "links_original_url_active_key";

/// Durable, authoritative store for link records.
///
/// Implementations must provide the uniqueness and atomic-increment
/// guarantees the resolution engine relies on; the engine holds no locks of
/// its own.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] with `details.constraint` set to
    /// [`CODE_CONSTRAINT`] or [`ORIGINAL_URL_CONSTRAINT`] when a uniqueness
    /// rule is violated.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by code, including soft-deleted rows.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Finds the non-deleted link for an original URL.
    async fn find_active_by_original_url(
        &self,
        original_url: &str,
    ) -> Result<Option<Link>, AppError>;

    /// Atomically increments `usage_count` in place and returns the new value.
    ///
    /// Returns `Ok(None)` if no non-deleted link has this code.
    async fn increment_usage(&self, code: &str) -> Result<Option<i64>, AppError>;

    /// Soft-deletes a link by setting `deleted_at = now()`.
    ///
    /// Returns `Ok(false)` if the link was not found or already deleted.
    async fn soft_delete(&self, code: &str) -> Result<bool, AppError>;

    /// Lists links, newest first.
    async fn list(&self, include_deleted: bool) -> Result<Vec<Link>, AppError>;

    /// Round-trips to the store for health checks.
    async fn ping(&self) -> Result<(), AppError>;
}
