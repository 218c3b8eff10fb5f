//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures; the only behaviour they carry is
//! derived state such as "is this record resolvable right now".
//!
//! # Entity Types
//!
//! - [`Link`] - A persisted short code → URL record
//! - [`NewLink`] - Input for inserting a record
//! - [`LinkStats`] - Usage metadata exposed by the stats endpoint

pub mod link;

pub use link::{Link, LinkStats, NewLink};
