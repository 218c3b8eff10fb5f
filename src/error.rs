//! Application error type and its HTTP representation.
//!
//! Every service and repository returns [`AppError`]. Handlers propagate it
//! with `?` and axum renders it through [`IntoResponse`] as:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Short link not found", "details": {} } }
//! ```

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload shared by all error responses.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Empty or malformed input. Never retried.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The record is absent or soft-deleted.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The record exists but its `expires_at` has passed.
    #[error("{message}")]
    Gone { message: String, details: Value },

    /// A uniqueness constraint was violated in the durable store.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// The client exhausted its request quota for the current window.
    #[error("{message}")]
    RateLimited {
        message: String,
        details: Value,
        retry_after: Option<u64>,
    },

    /// A backing store timed out or refused the connection.
    #[error("{message}")]
    DependencyUnavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn gone(message: impl Into<String>, details: Value) -> Self {
        Self::Gone {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self::RateLimited {
            message: message.into(),
            details: json!({ "retry_after": retry_after }),
            retry_after,
        }
    }

    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::DependencyUnavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Returns true if this is a uniqueness conflict on the named constraint.
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        match self {
            Self::Conflict { details, .. } => {
                details.get("constraint").and_then(Value::as_str) == Some(constraint)
            }
            _ => false,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Self::Gone { .. } => (StatusCode::GONE, "gone"),
            Self::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            Self::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Self::DependencyUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "dependency_unavailable")
            }
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Converts the error into the payload used in JSON bodies.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        let (message, details) = match self {
            Self::Validation { message, details }
            | Self::NotFound { message, details }
            | Self::Gone { message, details }
            | Self::Conflict { message, details }
            | Self::RateLimited {
                message, details, ..
            } => (message.clone(), details.clone()),
            // Backend error text stays in the logs.
            Self::DependencyUnavailable { .. } => {
                ("Service temporarily unavailable".to_string(), json!({}))
            }
            Self::Internal { .. } => ("Internal server error".to_string(), json!({})),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        match &self {
            Self::DependencyUnavailable { message, details } => {
                tracing::error!(%message, %details, "dependency unavailable");
            }
            Self::Internal { message, details } => {
                tracing::error!(%message, %details, "internal error");
            }
            _ => {}
        }

        let retry_after = match &self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        };

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(e.field_errors()).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}

/// Classifies a SQLx error into the application taxonomy.
///
/// Unique violations keep the constraint name so callers can tell a code
/// collision from a duplicate URL. Transport failures and server-side
/// connection errors (SQLSTATE class `08`, `57P01`..`57P03`) map to
/// [`AppError::DependencyUnavailable`].
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
        if db.code().is_some_and(|code| is_connection_sqlstate(&code)) {
            return AppError::unavailable(
                "Database unavailable",
                json!({ "reason": e.to_string() }),
            );
        }
    }

    match e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => {
            AppError::unavailable("Database unavailable", json!({ "reason": e.to_string() }))
        }
        other => AppError::internal("Database error", json!({ "reason": other.to_string() })),
    }
}

fn is_connection_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}
