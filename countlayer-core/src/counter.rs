//! The counter record model and its input shapes.
//!
//! A [`Counter`] is a numeric count with free-form metadata and a creation
//! timestamp. The metadata mapping is open and arbitrarily nested; it is the
//! part of the record addressed by filters (as `meta.<path>`).

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CounterStoreError, CounterStoreResult};

/// Open metadata mapping attached to every counter.
///
/// Values may be scalars, sequences, or further mappings; insertion order is
/// irrelevant.
pub type CounterMeta = Map<String, Value>;

/// The canonical persisted record.
///
/// `created_at` is always populated on read. Counters do not carry their own
/// identifier; identity is the opaque [`CounterId`] handed out at creation and
/// passed back to the same store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    /// The numeric count. Always finite.
    pub count: f64,
    /// Creation timestamp, stamped by the store when absent on write.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Free-form metadata.
    pub meta: CounterMeta,
}

/// Shape expected from callers when creating counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterInput {
    pub count: f64,
    /// Optional explicit creation time; defaults to "now" at the store.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub meta: CounterMeta,
}

impl CounterInput {
    /// Creates an input with the given count and metadata and no explicit
    /// creation time.
    pub fn new(count: f64, meta: CounterMeta) -> Self {
        Self { count, created_at: None, meta }
    }

    /// Sets an explicit creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Checks the structural invariants that the type system cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `count` is not a finite number. Raised
    /// before any I/O, so a rejected input is never partially applied.
    pub fn validate(&self) -> CounterStoreResult<()> {
        if !self.count.is_finite() {
            return Err(CounterStoreError::Validation(
                "counter count must be a finite number".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolves this input into a full [`Counter`], stamping the creation
    /// time if the caller did not supply one.
    pub fn into_counter(self) -> Counter {
        Counter {
            count: self.count,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            meta: self.meta,
        }
    }
}

/// Partial update shape: only fields present are replaced, everything else
/// retains its previous value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<f64>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<CounterMeta>,
}

impl CounterPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the count.
    pub fn count(mut self, count: f64) -> Self {
        self.count = Some(count);
        self
    }

    /// Replaces the creation timestamp.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Replaces the metadata mapping wholesale.
    pub fn meta(mut self, meta: CounterMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// True when the patch carries no recognized fields. Stores return an
    /// update count of 0 for empty patches without touching the record.
    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.created_at.is_none() && self.meta.is_none()
    }

    /// Checks the structural invariants of the supplied fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a supplied `count` is not finite.
    pub fn validate(&self) -> CounterStoreResult<()> {
        if let Some(count) = self.count
            && !count.is_finite()
        {
            return Err(CounterStoreError::Validation(
                "counter count must be a finite number".to_string(),
            ));
        }

        Ok(())
    }

    /// Merges this patch over an existing counter, replacing only the
    /// supplied fields.
    pub fn apply(self, counter: Counter) -> Counter {
        Counter {
            count: self.count.unwrap_or(counter.count),
            created_at: self.created_at.unwrap_or(counter.created_at),
            meta: self.meta.unwrap_or(counter.meta),
        }
    }
}

/// Opaque, backend-tagged counter identifier.
///
/// The document backend assigns object ids; the embedded row backend assigns
/// integer rowids. The tag makes handing an id to the wrong backend a checked
/// error rather than a silent miss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterId {
    /// Identifier assigned by the document backend.
    Object(ObjectId),
    /// Identifier assigned by the embedded row backend.
    Row(i64),
}

impl std::fmt::Display for CounterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterId::Object(oid) => write!(f, "{}", oid.to_hex()),
            CounterId::Row(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_finite_counts() {
        let mut input = CounterInput::new(f64::NAN, CounterMeta::new());
        assert!(input.validate().is_err());

        input.count = f64::INFINITY;
        assert!(input.validate().is_err());

        input.count = 1.5;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn rejects_null_meta_on_deserialize() {
        let err = serde_json::from_value::<CounterInput>(json!({
            "count": 1,
            "meta": null,
        }));
        assert!(err.is_err());
    }

    #[test]
    fn input_without_created_at_is_stamped() {
        let counter = CounterInput::new(2.0, CounterMeta::new()).into_counter();
        assert!(counter.created_at <= Utc::now());
    }

    #[test]
    fn patch_emptiness() {
        assert!(CounterPatch::new().is_empty());
        assert!(!CounterPatch::new().count(3.0).is_empty());
    }

    #[test]
    fn patch_replaces_only_supplied_fields() {
        let counter = CounterInput::new(1.0, CounterMeta::new())
            .with_created_at(Utc::now())
            .into_counter();
        let before = counter.clone();

        let updated = CounterPatch::new().count(9.0).apply(counter);
        assert_eq!(updated.count, 9.0);
        assert_eq!(updated.created_at, before.created_at);
        assert_eq!(updated.meta, before.meta);
    }

    #[test]
    fn patch_with_non_finite_count_is_rejected() {
        assert!(CounterPatch::new().count(f64::NEG_INFINITY).validate().is_err());
    }
}
