//! The filter language shared by every counter backend.
//!
//! Filters are structured predicates over counter fields. Callers can build
//! them fluently or parse them from the document-database wire syntax, where
//! operator objects use `$`-prefixed keys:
//!
//! ```ignore
//! use countlayer_core::filter::Filter;
//! use serde_json::json;
//!
//! // Wire syntax, parsed once into a typed expression tree
//! let parsed = Filter::from_value(&json!({
//!     "meta.status": "active",
//!     "meta.score": { "$gt": 5, "$lt": 15 },
//!     "$or": [
//!         { "meta.type": "shot" },
//!         { "meta.hole": { "$in": [2, 3] } },
//!     ],
//! }))?;
//!
//! // Equivalent fluent construction
//! let built = Filter::new()
//!     .eq("meta.status", json!("active"))
//!     .gt("meta.score", json!(5))
//!     .lt("meta.score", json!(15))
//!     .or([
//!         Filter::new().eq("meta.type", json!("shot")),
//!         Filter::new().any_of("meta.hole", vec![json!(2), json!(3)]),
//!     ]);
//! # Ok::<(), countlayer_core::error::CounterStoreError>(())
//! ```
//!
//! All non-`$or` clauses are AND-ed together; `$or` holds branches of which
//! at least one must match. An empty filter matches every record.
//!
//! Field paths are dot-separated and resolved from the record root
//! (`count`, `createdAt`, `meta.<path>`). Conditions are parsed exactly once
//! into tagged variants — the backends never re-inspect operator strings, and
//! regex patterns are compiled here rather than per record.

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{CounterStoreError, CounterStoreResult};

/// A single operator applied to a resolved field value.
///
/// Unknown operators parse into [`FilterOp::Unsupported`], which never
/// matches any record (closed, fail-fast policy) and which backends with
/// native query engines refuse to forward.
#[derive(Debug, Clone)]
pub enum FilterOp {
    /// Ordered greater-than comparison.
    Gt(Value),
    /// Ordered greater-than-or-equal comparison.
    Gte(Value),
    /// Ordered less-than comparison.
    Lt(Value),
    /// Ordered less-than-or-equal comparison.
    Lte(Value),
    /// Value equality with any element of the sequence.
    In(Vec<Value>),
    /// Value equality with no element of the sequence.
    Nin(Vec<Value>),
    /// Unanchored, case-sensitive match anywhere in a string field.
    Regex(Regex),
    /// An operator this filter language does not support. Fails closed.
    Unsupported(String),
}

impl FilterOp {
    /// The wire-syntax name of this operator.
    pub fn name(&self) -> &str {
        match self {
            FilterOp::Gt(_) => "$gt",
            FilterOp::Gte(_) => "$gte",
            FilterOp::Lt(_) => "$lt",
            FilterOp::Lte(_) => "$lte",
            FilterOp::In(_) => "$in",
            FilterOp::Nin(_) => "$nin",
            FilterOp::Regex(_) => "$regex",
            FilterOp::Unsupported(name) => name,
        }
    }

    fn parse(op: &str, operand: &Value) -> CounterStoreResult<FilterOp> {
        Ok(match op {
            "$gt" => FilterOp::Gt(operand.clone()),
            "$gte" => FilterOp::Gte(operand.clone()),
            "$lt" => FilterOp::Lt(operand.clone()),
            "$lte" => FilterOp::Lte(operand.clone()),
            // A non-sequence operand makes the condition unsatisfiable
            // rather than an error, matching the evaluation-time policy.
            "$in" => match operand.as_array() {
                Some(items) => FilterOp::In(items.clone()),
                None => FilterOp::Unsupported("$in".to_string()),
            },
            "$nin" => match operand.as_array() {
                Some(items) => FilterOp::Nin(items.clone()),
                None => FilterOp::Unsupported("$nin".to_string()),
            },
            "$regex" => match operand.as_str() {
                Some(pattern) => FilterOp::Regex(Regex::new(pattern).map_err(|e| {
                    CounterStoreError::Validation(format!(
                        "invalid regex pattern {pattern:?}: {e}"
                    ))
                })?),
                None => FilterOp::Unsupported("$regex".to_string()),
            },
            other => FilterOp::Unsupported(other.to_string()),
        })
    }
}

/// The condition attached to a single field path.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Deep value equality with the resolved field.
    Equals(Value),
    /// One or more operators, all of which must pass.
    Ops(Vec<FilterOp>),
}

impl Condition {
    fn parse(value: &Value) -> CounterStoreResult<Condition> {
        let Value::Object(map) = value else {
            return Ok(Condition::Equals(value.clone()));
        };

        let ops = map
            .iter()
            .filter(|(key, _)| key.starts_with('$'))
            .map(|(key, operand)| FilterOp::parse(key, operand))
            .collect::<CounterStoreResult<Vec<_>>>()?;

        // An object without operator keys is an ordinary literal.
        if ops.is_empty() {
            return Ok(Condition::Equals(value.clone()));
        }

        Ok(Condition::Ops(ops))
    }
}

/// A field path paired with its condition.
#[derive(Debug, Clone)]
pub struct Clause {
    /// Dot-separated path from the record root, e.g. `meta.status`.
    pub path: String,
    /// The condition the resolved value must satisfy.
    pub condition: Condition,
}

/// A structured predicate over counter records.
///
/// `clauses` are AND-ed together and with the `branches` result; when
/// `branches` is non-empty at least one branch must match.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// AND-ed field conditions.
    pub clauses: Vec<Clause>,
    /// `$or` branches; empty means no disjunction.
    pub branches: Vec<Filter>,
}

impl Filter {
    /// Creates an empty filter, which matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the filter has no clauses and no branches.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.branches.is_empty()
    }

    /// Parses a filter from the document-database wire syntax.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value is not an object, a `$or`
    /// value is not an array, or a `$regex` pattern does not compile.
    /// Unknown `$` operators are not errors here; they parse into conditions
    /// that never match.
    pub fn from_value(value: &Value) -> CounterStoreResult<Filter> {
        let map = value.as_object().ok_or_else(|| {
            CounterStoreError::Validation("filter must be an object".to_string())
        })?;

        Self::from_map(map)
    }

    fn from_map(map: &Map<String, Value>) -> CounterStoreResult<Filter> {
        let mut filter = Filter::new();

        for (key, value) in map {
            if key == "$or" {
                let subs = value.as_array().ok_or_else(|| {
                    CounterStoreError::Validation(
                        "$or must hold an array of sub-filters".to_string(),
                    )
                })?;

                for sub in subs {
                    filter.branches.push(Filter::from_value(sub)?);
                }

                continue;
            }

            filter.clauses.push(Clause {
                path: key.clone(),
                condition: Condition::parse(value)?,
            });
        }

        Ok(filter)
    }

    fn clause(mut self, path: impl Into<String>, condition: Condition) -> Self {
        self.clauses.push(Clause { path: path.into(), condition });
        self
    }

    /// Requires the field to equal the given value (deep value equality).
    pub fn eq(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clause(path, Condition::Equals(value.into()))
    }

    /// Requires the field to compare greater than the given value.
    pub fn gt(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clause(path, Condition::Ops(vec![FilterOp::Gt(value.into())]))
    }

    /// Requires the field to compare greater than or equal to the given value.
    pub fn gte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clause(path, Condition::Ops(vec![FilterOp::Gte(value.into())]))
    }

    /// Requires the field to compare less than the given value.
    pub fn lt(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clause(path, Condition::Ops(vec![FilterOp::Lt(value.into())]))
    }

    /// Requires the field to compare less than or equal to the given value.
    pub fn lte(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clause(path, Condition::Ops(vec![FilterOp::Lte(value.into())]))
    }

    /// Requires the field to equal one of the given values.
    pub fn any_of(self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.clause(path, Condition::Ops(vec![FilterOp::In(values)]))
    }

    /// Requires the field to equal none of the given values.
    pub fn none_of(self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.clause(path, Condition::Ops(vec![FilterOp::Nin(values)]))
    }

    /// Requires the string field to match the given pattern anywhere.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the pattern does not compile.
    pub fn regex(self, path: impl Into<String>, pattern: &str) -> CounterStoreResult<Self> {
        let compiled = Regex::new(pattern).map_err(|e| {
            CounterStoreError::Validation(format!("invalid regex pattern {pattern:?}: {e}"))
        })?;

        Ok(self.clause(path, Condition::Ops(vec![FilterOp::Regex(compiled)])))
    }

    /// Adds `$or` branches: at least one must match for the filter to match.
    pub fn or(mut self, branches: impl IntoIterator<Item = Filter>) -> Self {
        self.branches.extend(branches);
        self
    }
}
