//! Main countlayer crate providing a unified interface for counter storage.
//!
//! This crate is the primary entry point for users of the countlayer
//! framework. It re-exports the core types from the sub-crates and provides
//! convenient access to both storage backends plus an environment-variable
//! factory.
//!
//! # Features
//!
//! - **One filter syntax, two backends** - The same document-database-style
//!   filters run natively on MongoDB and in-process against the embedded
//!   row store
//! - **Uniform store contract** - create/get/compute/stream/get_by_id/
//!   update/delete/delete_all behave identically regardless of backend
//! - **Runtime backend selection** - Pick the engine from the environment or
//!   erase the backend type with [`store::CounterStore::into_dyn`]
//!
//! # Quick Start
//!
//! ```ignore
//! use countlayer::prelude::*;
//! use countlayer::sqlite::{MemoryDriver, SqliteBackend};
//! use serde_json::{Map, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = CounterStore::new(SqliteBackend::new(MemoryDriver::new()));
//!
//!     let mut meta = Map::new();
//!     meta.insert("status".to_string(), json!("active"));
//!     let id = store.create(CounterInput::new(1.0, meta)).await?;
//!
//!     let active = store
//!         .compute(&Filter::new().eq("meta.status", json!("active")))
//!         .await?;
//!     assert_eq!(active, 1);
//!
//!     let found = store.get_by_id(&id).await?;
//!     assert!(found.is_some());
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Environment-based construction
//!
//! ```ignore
//! use countlayer::env::from_env;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // COUNTLAYER_DB_ENGINE selects the backend ("mongo" is the default,
//!     // "sqlite" the embedded store); see the `env` module for the full
//!     // variable list.
//!     let store = from_env().await?;
//!
//!     let total = store.compute(&countlayer::filter::Filter::new()).await?;
//!     println!("stored counters: {total}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`sqlite`] - Embedded row storage, ephemeral or file-backed
//! - [`mongodb`] - MongoDB document storage (requires the `mongodb` feature,
//!   enabled by default)

pub mod env;
pub mod prelude;

pub use countlayer_core::{counter, error, filter, page, store};

/// Embedded row storage backend implementations.
pub mod sqlite {
    pub use countlayer_sqlite::{
        CounterRow, MemoryDriver, RowDriver, SqliteBackend, SqliteDriver, evaluator,
    };
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use countlayer_mongodb::{CollectionConfig, MongoDbBackend, MongoDbBackendBuilder};
}
