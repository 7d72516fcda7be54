//! Pagination options shared by all counter backends.

use serde::{Deserialize, Serialize};

/// Skip/limit window applied to query results.
///
/// `skip` elements are dropped from the front before `limit` elements are
/// taken. A `limit` of zero yields zero records; an absent limit yields all
/// remaining records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOptions {
    /// Maximum number of records to return.
    pub limit: Option<u64>,
    /// Number of records to skip before returning results.
    pub skip: Option<u64>,
}

impl PageOptions {
    /// Creates an unbounded window (all records).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of records to return.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of records to skip.
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Applies the window to an already-materialized result set.
    ///
    /// Used by backends without native skip/limit support; backends with
    /// native support must produce the same window.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = self.skip.unwrap_or(0) as usize;
        let limit = self.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        items.into_iter().skip(skip).take(limit).collect()
    }
}
