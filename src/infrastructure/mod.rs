//! Infrastructure layer for external integrations.
//!
//! Concrete implementations of the durable store and the volatile cache.
//!
//! # Modules
//!
//! - [`cache`] - Redis and in-memory cache implementations
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod persistence;
