//! Environment-variable construction of a counter store.
//!
//! Variables:
//!
//! - `COUNTLAYER_DB_ENGINE` - `"mongo"` (default) or `"sqlite"`,
//!   case-insensitive
//! - `COUNTLAYER_MONGO_CONNECTION` - MongoDB connection string
//! - `COUNTLAYER_MONGO_DATABASE` / `COUNTLAYER_MONGO_COLLECTION` - names of
//!   the database and collection holding the counters
//! - `COUNTLAYER_SQLITE_FILE` - path for persistent embedded storage;
//!   absent means ephemeral in-memory rows
//!
//! A `.env` file in the working directory is loaded first, if present.

use tracing::debug;

use countlayer_core::{
    error::{CounterStoreError, CounterStoreResult},
    store::{CounterStore, DynCounterStore},
};
use countlayer_sqlite::{MemoryDriver, SqliteBackend, SqliteDriver};

#[cfg(feature = "mongodb")]
use countlayer_mongodb::{CollectionConfig, MongoDbBackend};

/// Engine selector variable.
pub const ENGINE_VAR: &str = "COUNTLAYER_DB_ENGINE";
/// MongoDB connection string variable.
pub const MONGO_CONNECTION_VAR: &str = "COUNTLAYER_MONGO_CONNECTION";
/// MongoDB database name variable.
pub const MONGO_DATABASE_VAR: &str = "COUNTLAYER_MONGO_DATABASE";
/// MongoDB collection name variable.
pub const MONGO_COLLECTION_VAR: &str = "COUNTLAYER_MONGO_COLLECTION";
/// Embedded storage file path variable.
pub const SQLITE_FILE_VAR: &str = "COUNTLAYER_SQLITE_FILE";

/// The storage engine a store is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// MongoDB document storage.
    Mongo,
    /// Embedded row storage.
    Sqlite,
}

/// Resolves an engine selector value; anything other than `"sqlite"`
/// (case-insensitive), including absence, selects the document engine.
pub fn resolve_engine(value: Option<&str>) -> Engine {
    match value {
        Some(value) if value.eq_ignore_ascii_case("sqlite") => Engine::Sqlite,
        _ => Engine::Mongo,
    }
}

/// Reads the engine selector from the environment.
pub fn engine_from_env() -> Engine {
    resolve_engine(std::env::var(ENGINE_VAR).ok().as_deref())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn require_env(name: &str) -> CounterStoreResult<String> {
    env_value(name).ok_or_else(|| CounterStoreError::Config(format!("{name} is required")))
}

/// Builds a counter store from environment variables.
///
/// # Errors
///
/// Returns a connection error when the mongo engine is selected without a
/// connection string, a configuration error for missing names, and whatever
/// the chosen backend's construction reports.
pub async fn from_env() -> CounterStoreResult<DynCounterStore> {
    let _ = dotenvy::dotenv();

    let engine = engine_from_env();
    debug!(?engine, "building counter store from environment");

    match engine {
        Engine::Sqlite => {
            let backend = match env_value(SQLITE_FILE_VAR) {
                Some(path) => SqliteBackend::new(SqliteDriver::open(path)?),
                None => SqliteBackend::new(MemoryDriver::new()),
            };

            Ok(CounterStore::new(backend).into_dyn())
        }
        Engine::Mongo => mongo_from_env().await,
    }
}

#[cfg(feature = "mongodb")]
async fn mongo_from_env() -> CounterStoreResult<DynCounterStore> {
    let dsn = env_value(MONGO_CONNECTION_VAR).ok_or_else(|| {
        CounterStoreError::Connection(format!("{MONGO_CONNECTION_VAR} is required"))
    })?;

    let config = CollectionConfig::new(
        require_env(MONGO_DATABASE_VAR)?,
        require_env(MONGO_COLLECTION_VAR)?,
    )?;

    let backend = MongoDbBackend::builder(&dsn, config).build().await?;

    Ok(CounterStore::new(backend).into_dyn())
}

#[cfg(not(feature = "mongodb"))]
async fn mongo_from_env() -> CounterStoreResult<DynCounterStore> {
    Err(CounterStoreError::Config(format!(
        "built without mongodb support; set {ENGINE_VAR}=sqlite or enable the `mongodb` feature"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_is_selected_case_insensitively() {
        assert_eq!(resolve_engine(Some("sqlite")), Engine::Sqlite);
        assert_eq!(resolve_engine(Some("SQLite")), Engine::Sqlite);
    }

    #[test]
    fn anything_else_defaults_to_mongo() {
        assert_eq!(resolve_engine(None), Engine::Mongo);
        assert_eq!(resolve_engine(Some("mongo")), Engine::Mongo);
        assert_eq!(resolve_engine(Some("postgres")), Engine::Mongo);
        assert_eq!(resolve_engine(Some("")), Engine::Mongo);
    }
}
