//! Application layer services implementing business logic.
//!
//! Services consume the repository and cache traits and give the HTTP
//! handlers and the admin CLI a single API.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Creation, cache-aside resolution and deletion
//! - [`services::rate_limiter::RateLimiter`] - Fixed-window per-client request limiting

pub mod services;
