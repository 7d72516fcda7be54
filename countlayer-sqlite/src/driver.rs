//! The row-driver seam beneath the embedded backend.
//!
//! A [`RowDriver`] provides the minimal tabular operations the adapter needs:
//! one logical table of `(id, count, created_at, meta)` rows where `meta` is
//! serialized JSON and `created_at` an RFC 3339 string. Ids are
//! driver-assigned, monotonically increasing integers.

use std::{
    fmt::Debug,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use mea::rwlock::RwLock;
use rusqlite::{Connection, OptionalExtension, params};

use countlayer_core::error::{CounterStoreError, CounterStoreResult};

/// A single stored counter row, as the driver sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterRow {
    /// Driver-assigned row id.
    pub id: i64,
    pub count: f64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Serialized JSON metadata mapping.
    pub meta: String,
}

/// Minimal tabular operations expected from a row backend.
///
/// Implementations own their storage and id assignment; the adapter above
/// them owns serialization, filtering, and the store contract.
#[async_trait]
pub trait RowDriver: Send + Sync + Debug {
    /// Creates the counter table if it does not exist. Idempotent.
    async fn ensure_table(&self, table: &str) -> CounterStoreResult<()>;

    /// Inserts a row and returns its driver-assigned id.
    async fn insert(
        &self,
        table: &str,
        count: f64,
        created_at: &str,
        meta: &str,
    ) -> CounterStoreResult<i64>;

    /// Returns every row, ordered by id.
    async fn select_all(&self, table: &str) -> CounterStoreResult<Vec<CounterRow>>;

    /// Returns the row with the given id, if any.
    async fn select_by_id(&self, table: &str, id: i64) -> CounterStoreResult<Option<CounterRow>>;

    /// Writes a row back in place, returning the number of rows changed.
    async fn update(&self, table: &str, row: &CounterRow) -> CounterStoreResult<u64>;

    /// Deletes the row with the given id, returning the number deleted.
    async fn delete(&self, table: &str, id: i64) -> CounterStoreResult<u64>;

    /// Deletes every row, returning the number deleted.
    async fn delete_all(&self, table: &str) -> CounterStoreResult<u64>;
}

#[derive(Debug)]
struct MemoryTable {
    rows: Vec<CounterRow>,
    next_id: i64,
}

/// Ephemeral in-memory row driver.
///
/// Holds a single logical table regardless of the table name it is asked
/// for. Cloning shares the underlying rows, so multiple handles observe the
/// same data.
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    table: Arc<RwLock<MemoryTable>>,
}

impl MemoryDriver {
    /// Creates an empty in-memory driver.
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(MemoryTable { rows: Vec::new(), next_id: 1 })),
        }
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RowDriver for MemoryDriver {
    async fn ensure_table(&self, _table: &str) -> CounterStoreResult<()> {
        Ok(())
    }

    async fn insert(
        &self,
        _table: &str,
        count: f64,
        created_at: &str,
        meta: &str,
    ) -> CounterStoreResult<i64> {
        let mut table = self.table.write().await;
        let id = table.next_id;
        table.next_id += 1;

        table.rows.push(CounterRow {
            id,
            count,
            created_at: created_at.to_string(),
            meta: meta.to_string(),
        });

        Ok(id)
    }

    async fn select_all(&self, _table: &str) -> CounterStoreResult<Vec<CounterRow>> {
        Ok(self.table.read().await.rows.clone())
    }

    async fn select_by_id(
        &self,
        _table: &str,
        id: i64,
    ) -> CounterStoreResult<Option<CounterRow>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn update(&self, _table: &str, row: &CounterRow) -> CounterStoreResult<u64> {
        let mut table = self.table.write().await;

        match table.rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, _table: &str, id: i64) -> CounterStoreResult<u64> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|row| row.id != id);

        Ok((before - table.rows.len()) as u64)
    }

    async fn delete_all(&self, _table: &str) -> CounterStoreResult<u64> {
        let mut table = self.table.write().await;
        let deleted = table.rows.len() as u64;
        table.rows.clear();

        Ok(deleted)
    }
}

/// Row driver backed by a real SQLite database via rusqlite.
///
/// The connection lives behind a mutex; operations run on the calling task.
/// Fine for an embedded store with short statements.
#[derive(Debug)]
pub struct SqliteDriver {
    conn: Mutex<Connection>,
}

impl SqliteDriver {
    /// Opens (or creates) a database file at the given path.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> CounterStoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| CounterStoreError::Connection(e.to_string()))?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens an ephemeral in-memory database.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the database cannot be created.
    pub fn open_in_memory() -> CounterStoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CounterStoreError::Connection(e.to_string()))?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> CounterStoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CounterStoreError::Internal("connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl RowDriver for SqliteDriver {
    async fn ensure_table(&self, table: &str) -> CounterStoreResult<()> {
        self.lock()?
            .execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        count REAL NOT NULL,
                        created_at TEXT NOT NULL,
                        meta TEXT NOT NULL
                    )"
                ),
                [],
            )
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn insert(
        &self,
        table: &str,
        count: f64,
        created_at: &str,
        meta: &str,
    ) -> CounterStoreResult<i64> {
        let conn = self.lock()?;

        conn.execute(
            &format!("INSERT INTO {table} (count, created_at, meta) VALUES (?1, ?2, ?3)"),
            params![count, created_at, meta],
        )
        .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    async fn select_all(&self, table: &str) -> CounterStoreResult<Vec<CounterRow>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, count, created_at, meta FROM {table} ORDER BY id"
            ))
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(CounterRow {
                    id: row.get(0)?,
                    count: row.get(1)?,
                    created_at: row.get(2)?,
                    meta: row.get(3)?,
                })
            })
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        Ok(rows)
    }

    async fn select_by_id(
        &self,
        table: &str,
        id: i64,
    ) -> CounterStoreResult<Option<CounterRow>> {
        self.lock()?
            .query_row(
                &format!("SELECT id, count, created_at, meta FROM {table} WHERE id = ?1"),
                params![id],
                |row| {
                    Ok(CounterRow {
                        id: row.get(0)?,
                        count: row.get(1)?,
                        created_at: row.get(2)?,
                        meta: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(|e| CounterStoreError::Backend(e.to_string()))
    }

    async fn update(&self, table: &str, row: &CounterRow) -> CounterStoreResult<u64> {
        let changes = self
            .lock()?
            .execute(
                &format!(
                    "UPDATE {table} SET count = ?1, created_at = ?2, meta = ?3 WHERE id = ?4"
                ),
                params![row.count, row.created_at, row.meta, row.id],
            )
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        Ok(changes as u64)
    }

    async fn delete(&self, table: &str, id: i64) -> CounterStoreResult<u64> {
        let changes = self
            .lock()?
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        Ok(changes as u64)
    }

    async fn delete_all(&self, table: &str) -> CounterStoreResult<u64> {
        let changes = self
            .lock()?
            .execute(&format!("DELETE FROM {table}"), [])
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        Ok(changes as u64)
    }
}
