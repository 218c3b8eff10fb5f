//! Validation of submitted original URLs.

use url::Url;

/// Errors returned for rejected URLs.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Original URL is required")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,

    #[error("URL must not contain control characters")]
    ControlCharacter,
}

/// Validates an original URL and returns the string to store.
///
/// Surrounding whitespace is trimmed; the remainder is kept verbatim so that
/// the redirect target is exactly what the client submitted. Schemes other
/// than `http` and `https` (`javascript:`, `data:`, `file:`) are rejected.
/// Embedded control characters are rejected rather than left to the parser,
/// which strips them silently while the stored string would keep them.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(validate_url("  https://example.com  ").unwrap(), "https://example.com");
/// assert!(validate_url("javascript:alert(1)").is_err());
/// ```
pub fn validate_url(input: &str) -> Result<String, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(UrlValidationError::ControlCharacter);
    }

    let url = Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(trimmed.to_string())
}
