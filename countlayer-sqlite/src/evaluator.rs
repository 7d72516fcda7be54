//! In-process filter evaluation for the embedded row backend.
//!
//! The row backend has no native structured-query support, so filters are
//! applied here, one deserialized record at a time. Evaluation is pure and
//! synchronous: no I/O, no shared state.

use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value;

use countlayer_core::{
    counter::Counter,
    filter::{Clause, Condition, Filter, FilterOp},
};

/// Type-erased, comparable view of record and filter values.
///
/// Numbers are normalized to f64 so integral and real counts compare the way
/// callers expect. Ordering is defined within a type only; values of
/// different types never compare — except datetimes against RFC 3339
/// strings, which is how filter operands address `createdAt`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime<Utc>),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(value.as_f64().unwrap_or(f64::NAN)),
            Value::String(value) => Comparable::String(value),
            Value::Array(items) => Comparable::Array(
                items
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Value::Object(map) => Comparable::Map(
                map.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
        }
    }
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::DateTime(a), Comparable::String(s))
            | (Comparable::String(s), Comparable::DateTime(a)) => {
                parse_datetime(s).is_some_and(|b| *a == b)
            }
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::String(s)) => {
                parse_datetime(s).and_then(|b| a.partial_cmp(&b))
            }
            (Comparable::String(s), Comparable::DateTime(b)) => {
                parse_datetime(s).and_then(|a| a.partial_cmp(b))
            }
            _ => None,
        }
    }
}

/// Resolves a dot-separated path from the record root.
///
/// Returns `None` when any intermediate value is absent, not a mapping, or
/// missing the next segment — "undefined", distinct from a stored `null`.
fn resolve<'a>(counter: &'a Counter, path: &str) -> Option<Comparable<'a>> {
    let mut segments = path.split('.');
    let head = segments.next()?;

    match head {
        "count" => segments
            .next()
            .is_none()
            .then_some(Comparable::Number(counter.count)),
        "createdAt" => segments
            .next()
            .is_none()
            .then_some(Comparable::DateTime(counter.created_at)),
        "meta" => {
            let Some(first) = segments.next() else {
                return Some(Comparable::Map(
                    counter
                        .meta
                        .iter()
                        .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                        .collect(),
                ));
            };

            let mut current = counter.meta.get(first)?;
            for segment in segments {
                current = current.as_object()?.get(segment)?;
            }

            Some(Comparable::from(current))
        }
        _ => None,
    }
}

fn ordered(
    field: Option<&Comparable<'_>>,
    operand: &Value,
    accept: impl Fn(Ordering) -> bool,
) -> bool {
    field
        .and_then(|f| f.partial_cmp(&Comparable::from(operand)))
        .is_some_and(accept)
}

fn op_matches(field: Option<&Comparable<'_>>, op: &FilterOp) -> bool {
    match op {
        FilterOp::Gt(operand) => ordered(field, operand, |o| o == Ordering::Greater),
        FilterOp::Gte(operand) => ordered(field, operand, |o| o != Ordering::Less),
        FilterOp::Lt(operand) => ordered(field, operand, |o| o == Ordering::Less),
        FilterOp::Lte(operand) => ordered(field, operand, |o| o != Ordering::Greater),
        FilterOp::In(values) => {
            field.is_some_and(|f| values.iter().any(|v| Comparable::from(v) == *f))
        }
        // Vacuously true for an undefined field: nothing equals nothing.
        FilterOp::Nin(values) => {
            !field.is_some_and(|f| values.iter().any(|v| Comparable::from(v) == *f))
        }
        FilterOp::Regex(re) => {
            matches!(field, Some(Comparable::String(s)) if re.is_match(s))
        }
        FilterOp::Unsupported(_) => false,
    }
}

fn clause_matches(counter: &Counter, clause: &Clause) -> bool {
    let field = resolve(counter, &clause.path);

    match &clause.condition {
        Condition::Equals(value) => {
            field.is_some_and(|f| f == Comparable::from(value))
        }
        Condition::Ops(ops) => ops.iter().all(|op| op_matches(field.as_ref(), op)),
    }
}

/// Decides whether a single counter matches a filter.
///
/// All clauses must pass (short-circuit AND); when `$or` branches are present
/// and non-empty, at least one must match as well. An empty filter matches
/// every record.
pub fn matches(counter: &Counter, filter: &Filter) -> bool {
    for clause in &filter.clauses {
        if !clause_matches(counter, clause) {
            return false;
        }
    }

    if !filter.branches.is_empty()
        && !filter.branches.iter().any(|branch| matches(counter, branch))
    {
        return false;
    }

    true
}
