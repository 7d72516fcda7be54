//! The embedded row store adapter.
//!
//! Translates the counter store contract into row operations over a
//! [`RowDriver`], using the in-process [`evaluator`](crate::evaluator) for
//! `get`/`compute`/`stream` because the row backend has no native
//! structured-query support.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::{StreamExt, stream};
use tokio::sync::OnceCell;
use tracing::debug;

use countlayer_core::{
    counter::{Counter, CounterId, CounterInput, CounterMeta, CounterPatch},
    error::{CounterStoreError, CounterStoreResult},
    filter::Filter,
    page::PageOptions,
    store::{CounterBackend, CounterStream},
};

use crate::{
    driver::{CounterRow, RowDriver},
    evaluator,
};

/// Table name used when none is configured.
pub const DEFAULT_TABLE: &str = "counters";

/// Counter store backend over a single table of rows.
///
/// The table is created lazily on first use; concurrent first calls observe
/// at most one initialization attempt. Rows hold the count, an RFC 3339
/// creation timestamp, and the metadata mapping serialized as JSON.
#[derive(Debug)]
pub struct SqliteBackend {
    driver: Box<dyn RowDriver>,
    table: String,
    init: OnceCell<()>,
}

impl SqliteBackend {
    /// Creates a backend over the given driver with the default table name.
    pub fn new(driver: impl RowDriver + 'static) -> Self {
        Self {
            driver: Box::new(driver),
            table: DEFAULT_TABLE.to_string(),
            init: OnceCell::new(),
        }
    }

    /// Creates a backend with a custom table name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is empty or is not a plain
    /// identifier (the name is interpolated into SQL).
    pub fn with_table(
        driver: impl RowDriver + 'static,
        table: impl Into<String>,
    ) -> CounterStoreResult<Self> {
        let table = table.into();

        if table.is_empty() {
            return Err(CounterStoreError::Config("table name is required".to_string()));
        }

        if !table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(CounterStoreError::Config(format!(
                "invalid table name {table:?}"
            )));
        }

        Ok(Self {
            driver: Box::new(driver),
            table,
            init: OnceCell::new(),
        })
    }

    async fn ensure_initialized(&self) -> CounterStoreResult<()> {
        // One-shot gate: a failed attempt leaves the cell unset so the next
        // call retries.
        self.init
            .get_or_try_init(|| async {
                debug!(table = %self.table, "ensuring counter table");
                self.driver.ensure_table(&self.table).await
            })
            .await?;

        Ok(())
    }

    fn row_id(id: &CounterId) -> CounterStoreResult<i64> {
        match id {
            CounterId::Row(id) => Ok(*id),
            CounterId::Object(_) => Err(CounterStoreError::Validation(
                "document object id passed to the embedded row backend".to_string(),
            )),
        }
    }

    fn format_created_at(created_at: DateTime<Utc>) -> String {
        created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn row_to_counter(row: &CounterRow) -> CounterStoreResult<Counter> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| {
                CounterStoreError::Internal(format!(
                    "malformed created_at in row {}: {e}",
                    row.id
                ))
            })?
            .with_timezone(&Utc);

        let meta: CounterMeta = serde_json::from_str(&row.meta).map_err(|e| {
            CounterStoreError::Internal(format!("malformed meta in row {}: {e}", row.id))
        })?;

        Ok(Counter { count: row.count, created_at, meta })
    }

    /// Loads every row, deserializes, and keeps the records the filter
    /// matches. Rows that fail to deserialize fail the whole call (closed).
    async fn load_matching(&self, filter: &Filter) -> CounterStoreResult<Vec<Counter>> {
        self.ensure_initialized().await?;

        let rows = self.driver.select_all(&self.table).await?;
        let mut counters = Vec::with_capacity(rows.len());

        for row in &rows {
            counters.push(Self::row_to_counter(row)?);
        }

        if !filter.is_empty() {
            counters.retain(|counter| evaluator::matches(counter, filter));
        }

        debug!(table = %self.table, matched = counters.len(), scanned = rows.len(), "filter scan");

        Ok(counters)
    }
}

#[async_trait]
impl CounterBackend for SqliteBackend {
    async fn create(&self, counter: CounterInput) -> CounterStoreResult<CounterId> {
        counter.validate()?;
        self.ensure_initialized().await?;

        let record = counter.into_counter();
        let created_at = Self::format_created_at(record.created_at);
        let meta = serde_json::to_string(&record.meta)?;

        let id = self
            .driver
            .insert(&self.table, record.count, &created_at, &meta)
            .await?;

        Ok(CounterId::Row(id))
    }

    async fn get(
        &self,
        filter: &Filter,
        page: Option<PageOptions>,
    ) -> CounterStoreResult<Vec<Counter>> {
        let counters = self.load_matching(filter).await?;

        Ok(match page {
            Some(page) => page.slice(counters),
            None => counters,
        })
    }

    async fn compute(&self, filter: &Filter) -> CounterStoreResult<u64> {
        Ok(self.load_matching(filter).await?.len() as u64)
    }

    async fn stream(&self, filter: &Filter) -> CounterStoreResult<CounterStream> {
        // The fetch is eager, the yield is lazy: dropping the stream early
        // costs nothing further.
        let counters = self.load_matching(filter).await?;

        Ok(stream::iter(counters.into_iter().map(Ok)).boxed())
    }

    async fn get_by_id(&self, id: &CounterId) -> CounterStoreResult<Option<Counter>> {
        let row_id = Self::row_id(id)?;
        self.ensure_initialized().await?;

        match self.driver.select_by_id(&self.table, row_id).await? {
            Some(row) => Ok(Some(Self::row_to_counter(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: &CounterId, patch: CounterPatch) -> CounterStoreResult<u64> {
        patch.validate()?;

        if patch.is_empty() {
            return Ok(0);
        }

        let row_id = Self::row_id(id)?;
        self.ensure_initialized().await?;

        let Some(row) = self.driver.select_by_id(&self.table, row_id).await? else {
            return Ok(0);
        };

        let merged = patch.apply(Self::row_to_counter(&row)?);
        let updated = CounterRow {
            id: row_id,
            count: merged.count,
            created_at: Self::format_created_at(merged.created_at),
            meta: serde_json::to_string(&merged.meta)?,
        };

        self.driver.update(&self.table, &updated).await
    }

    async fn delete(&self, id: &CounterId) -> CounterStoreResult<u64> {
        let row_id = Self::row_id(id)?;
        self.ensure_initialized().await?;

        self.driver.delete(&self.table, row_id).await
    }

    async fn delete_all(&self) -> CounterStoreResult<u64> {
        self.ensure_initialized().await?;

        let deleted = self.driver.delete_all(&self.table).await?;
        debug!(table = %self.table, deleted, "deleted all counters");

        Ok(deleted)
    }
}
