//! The store contract every counter backend satisfies, and the thin facade
//! callers hold.
//!
//! This module provides:
//!
//! - [`CounterBackend`] - The async trait implemented by each storage backend
//! - [`CounterStore`] - The caller-facing facade that forwards to a backend
//! - [`DynCounterStore`] - The boxed spelling for runtime backend selection
//!
//! Both backends must expose identical observable semantics for every
//! operation, so callers never know (or care) which store is active.
//!
//! # Example
//!
//! ```ignore
//! use countlayer_core::store::CounterStore;
//!
//! let store = CounterStore::new(backend);
//! let id = store.create(input).await?;
//! let found = store.get_by_id(&id).await?;
//! ```

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::{
    counter::{Counter, CounterId, CounterInput, CounterPatch},
    error::CounterStoreResult,
    filter::Filter,
    page::PageOptions,
};

/// A finite, lazily produced sequence of counters.
///
/// Streams are not restartable: once exhausted (or dropped early) the
/// underlying cursor is gone. Dropping a stream before exhaustion must not
/// trigger further physical reads.
pub type CounterStream = BoxStream<'static, CounterStoreResult<Counter>>;

/// Abstract interface for counter storage backends.
///
/// Implementations must be thread-safe and support concurrent calls; a single
/// `create`, `update`, or `delete` is atomic at the record level, while
/// `delete_all` makes no atomicity promise across concurrent writers.
///
/// Result ordering for `get` and `stream` is backend-defined but must be
/// stable within a single un-mutated dataset, and identical between the two
/// operations.
#[async_trait]
pub trait CounterBackend: Send + Sync + Debug {
    /// Creates a new counter record and returns its store-assigned id.
    ///
    /// Validates the input before any I/O and stamps `created_at` when the
    /// caller did not supply one.
    async fn create(&self, counter: CounterInput) -> CounterStoreResult<CounterId>;

    /// Retrieves the counters matching the filter, windowed by `page`.
    ///
    /// `skip` elements are dropped from the front before `limit` elements are
    /// taken; no options means all matches.
    async fn get(
        &self,
        filter: &Filter,
        page: Option<PageOptions>,
    ) -> CounterStoreResult<Vec<Counter>>;

    /// Counts the records matching the filter.
    ///
    /// Always equals the length of an unpaginated [`get`](Self::get) with the
    /// same filter.
    async fn compute(&self, filter: &Filter) -> CounterStoreResult<u64>;

    /// Streams the counters matching the filter, lazily and without
    /// pagination. Same matches and ordering as [`get`](Self::get).
    async fn stream(&self, filter: &Filter) -> CounterStoreResult<CounterStream>;

    /// Retrieves a single counter by id, or `None` when absent.
    ///
    /// Never errors for a well-formed but nonexistent id of this backend's
    /// variant.
    async fn get_by_id(&self, id: &CounterId) -> CounterStoreResult<Option<Counter>>;

    /// Partially updates a counter by id; only fields present in the patch
    /// are replaced.
    ///
    /// Returns the number of records updated (0 or 1). An empty patch or an
    /// unknown id returns 0; this never creates a record.
    async fn update(&self, id: &CounterId, patch: CounterPatch) -> CounterStoreResult<u64>;

    /// Deletes a single counter by id, returning the number deleted (0 or 1).
    /// Deleting a nonexistent id is not an error.
    async fn delete(&self, id: &CounterId) -> CounterStoreResult<u64>;

    /// Unconditionally deletes every record, returning the number deleted.
    /// Destructive; intended for test and development use.
    async fn delete_all(&self) -> CounterStoreResult<u64>;

    /// Releases backend resources. The default implementation is a no-op.
    async fn shutdown(&self) -> CounterStoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<B> CounterBackend for &B
where
    B: CounterBackend,
{
    async fn create(&self, counter: CounterInput) -> CounterStoreResult<CounterId> {
        (*self).create(counter).await
    }

    async fn get(
        &self,
        filter: &Filter,
        page: Option<PageOptions>,
    ) -> CounterStoreResult<Vec<Counter>> {
        (*self).get(filter, page).await
    }

    async fn compute(&self, filter: &Filter) -> CounterStoreResult<u64> {
        (*self).compute(filter).await
    }

    async fn stream(&self, filter: &Filter) -> CounterStoreResult<CounterStream> {
        (*self).stream(filter).await
    }

    async fn get_by_id(&self, id: &CounterId) -> CounterStoreResult<Option<Counter>> {
        (*self).get_by_id(id).await
    }

    async fn update(&self, id: &CounterId, patch: CounterPatch) -> CounterStoreResult<u64> {
        (*self).update(id, patch).await
    }

    async fn delete(&self, id: &CounterId) -> CounterStoreResult<u64> {
        (*self).delete(id).await
    }

    async fn delete_all(&self) -> CounterStoreResult<u64> {
        (*self).delete_all().await
    }

    async fn shutdown(&self) -> CounterStoreResult<()> {
        (*self).shutdown().await
    }
}

#[async_trait]
impl<B> CounterBackend for Box<B>
where
    B: CounterBackend + ?Sized,
{
    async fn create(&self, counter: CounterInput) -> CounterStoreResult<CounterId> {
        (**self).create(counter).await
    }

    async fn get(
        &self,
        filter: &Filter,
        page: Option<PageOptions>,
    ) -> CounterStoreResult<Vec<Counter>> {
        (**self).get(filter, page).await
    }

    async fn compute(&self, filter: &Filter) -> CounterStoreResult<u64> {
        (**self).compute(filter).await
    }

    async fn stream(&self, filter: &Filter) -> CounterStoreResult<CounterStream> {
        (**self).stream(filter).await
    }

    async fn get_by_id(&self, id: &CounterId) -> CounterStoreResult<Option<Counter>> {
        (**self).get_by_id(id).await
    }

    async fn update(&self, id: &CounterId, patch: CounterPatch) -> CounterStoreResult<u64> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: &CounterId) -> CounterStoreResult<u64> {
        (**self).delete(id).await
    }

    async fn delete_all(&self) -> CounterStoreResult<u64> {
        (**self).delete_all().await
    }

    async fn shutdown(&self) -> CounterStoreResult<()> {
        (**self).shutdown().await
    }
}

/// The caller-facing counter store, bound to a backend implementation.
///
/// A thin pass-through: every method forwards to the backend unchanged, so
/// the observable semantics are exactly the backend contract.
#[derive(Debug)]
pub struct CounterStore<B: CounterBackend> {
    backend: B,
}

/// A counter store over a runtime-selected backend.
pub type DynCounterStore = CounterStore<Box<dyn CounterBackend>>;

impl<B: CounterBackend> CounterStore<B> {
    /// Creates a store over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Borrows the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Erases the backend type for runtime backend selection.
    pub fn into_dyn(self) -> DynCounterStore
    where
        B: 'static,
    {
        CounterStore::new(Box::new(self.backend) as Box<dyn CounterBackend>)
    }

    /// Creates a new counter record. See [`CounterBackend::create`].
    pub async fn create(&self, counter: CounterInput) -> CounterStoreResult<CounterId> {
        self.backend.create(counter).await
    }

    /// Retrieves matching counters. See [`CounterBackend::get`].
    pub async fn get(
        &self,
        filter: &Filter,
        page: Option<PageOptions>,
    ) -> CounterStoreResult<Vec<Counter>> {
        self.backend.get(filter, page).await
    }

    /// Counts matching counters. See [`CounterBackend::compute`].
    pub async fn compute(&self, filter: &Filter) -> CounterStoreResult<u64> {
        self.backend.compute(filter).await
    }

    /// Streams matching counters. See [`CounterBackend::stream`].
    pub async fn stream(&self, filter: &Filter) -> CounterStoreResult<CounterStream> {
        self.backend.stream(filter).await
    }

    /// Retrieves a counter by id. See [`CounterBackend::get_by_id`].
    pub async fn get_by_id(&self, id: &CounterId) -> CounterStoreResult<Option<Counter>> {
        self.backend.get_by_id(id).await
    }

    /// Partially updates a counter by id. See [`CounterBackend::update`].
    pub async fn update(&self, id: &CounterId, patch: CounterPatch) -> CounterStoreResult<u64> {
        self.backend.update(id, patch).await
    }

    /// Deletes a counter by id. See [`CounterBackend::delete`].
    pub async fn delete(&self, id: &CounterId) -> CounterStoreResult<u64> {
        self.backend.delete(id).await
    }

    /// Deletes every record. See [`CounterBackend::delete_all`].
    pub async fn delete_all(&self) -> CounterStoreResult<u64> {
        self.backend.delete_all().await
    }

    /// Shuts down the store and releases backend resources.
    ///
    /// This consumes the store and should be called when no longer needed.
    pub async fn shutdown(self) -> CounterStoreResult<()> {
        self.backend.shutdown().await
    }
}
