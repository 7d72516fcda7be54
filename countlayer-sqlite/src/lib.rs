//! Embedded row storage backend for countlayer.
//!
//! This crate implements the counter store contract over a single SQLite-style
//! table of rows. Because the row backend has no native structured-query
//! support, filters are evaluated in-process by the [`evaluator`] against
//! deserialized records — the same filter syntax the document backend forwards
//! natively.
//!
//! Two row drivers are provided behind the [`driver::RowDriver`] seam:
//!
//! - [`MemoryDriver`] - Ephemeral in-memory rows, for tests and throwaway data
//! - [`SqliteDriver`] - A real SQLite database, file-backed or in-memory
//!
//! # Quick Start
//!
//! ```ignore
//! use countlayer_core::{counter::CounterInput, filter::Filter, store::CounterStore};
//! use countlayer_sqlite::{MemoryDriver, SqliteBackend};
//! use serde_json::Map;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = CounterStore::new(SqliteBackend::new(MemoryDriver::new()));
//!
//!     let id = store.create(CounterInput::new(1.0, Map::new())).await?;
//!     let found = store.get_by_id(&id).await?;
//!     assert!(found.is_some());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as countlayer_sqlite;

pub mod driver;
pub mod evaluator;
pub mod store;

pub use driver::{CounterRow, MemoryDriver, RowDriver, SqliteDriver};
pub use store::SqliteBackend;
