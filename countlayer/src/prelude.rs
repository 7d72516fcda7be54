//! Convenient re-exports of commonly used types from countlayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types without importing from multiple sub-modules:
//!
//! ```ignore
//! use countlayer::prelude::*;
//! ```

pub use countlayer_core::{
    counter::{Counter, CounterId, CounterInput, CounterMeta, CounterPatch},
    error::{CounterStoreError, CounterStoreResult},
    filter::Filter,
    page::PageOptions,
    store::{CounterBackend, CounterStore, CounterStream, DynCounterStore},
};

pub use crate::env::{Engine, from_env, resolve_engine};
