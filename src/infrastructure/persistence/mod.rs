//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage, usage counting and soft deletion

pub mod pg_link_repository;

pub use pg_link_repository::PgLinkRepository;
