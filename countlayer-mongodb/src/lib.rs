//! MongoDB backend implementation for countlayer.
//!
//! This crate provides a MongoDB-based implementation of the counter store
//! contract. Filters are translated into native query documents and executed
//! by the server, so the in-process evaluator is never involved — both
//! backends are held to the same observable semantics by a shared
//! conformance suite instead.
//!
//! # Connection
//!
//! The builder parses a MongoDB connection string; the driver connects
//! lazily on first use.
//!
//! # Example
//!
//! ```ignore
//! use countlayer_mongodb::{CollectionConfig, MongoDbBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CollectionConfig::new("fancy", "counters")?;
//!     let backend = MongoDbBackend::builder("mongodb://localhost:27017", config)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as countlayer_mongodb;

pub mod query;
pub mod store;

pub use store::{CollectionConfig, MongoDbBackend, MongoDbBackendBuilder};
