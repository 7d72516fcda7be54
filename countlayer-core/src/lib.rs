//! A thin counter storage abstraction layer that provides a unified interface for working with counter stores.
//!
//! This crate is the core of the countlayer project and provides:
//!
//! - **Counter model** ([`counter`]) - The persisted record type, its input/patch shapes, and backend-tagged identifiers
//! - **Filter API** ([`filter`]) - A document-database-style filter language parsed into a typed expression tree
//! - **Store backend abstraction** ([`store`]) - The trait every storage backend must satisfy, plus the caller-facing facade
//! - **Pagination** ([`page`]) - Skip/limit options shared by all backends
//! - **Error handling** ([`error`]) - Error kinds and result types
//!
//! # Example
//!
//! ```ignore
//! use countlayer_core::{counter::CounterInput, filter::Filter};
//! use serde_json::{json, Map};
//!
//! let input = CounterInput::new(1.0, Map::new());
//!
//! let filter = Filter::new()
//!     .eq("meta.status", json!("active"))
//!     .gt("meta.score", json!(5));
//! ```

#[allow(unused_extern_crates)]
extern crate self as countlayer_core;

pub mod counter;
pub mod error;
pub mod filter;
pub mod page;
pub mod store;
