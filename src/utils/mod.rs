//! Utility functions for code generation, URL validation, and request handling.
//!
//! - [`code_generator`] - Random alphanumeric short codes
//! - [`url_validator`] - Validation of submitted URLs
//! - [`client_ip`] - Client address extraction for rate limiting
//! - [`clock`] - Injectable wall clock

pub mod client_ip;
pub mod clock;
pub mod code_generator;
pub mod url_validator;
