//! Filter translation from the countlayer expression tree to MongoDB query
//! syntax.
//!
//! The document backend never evaluates filters itself; it hands the
//! translated document to the server. Operators the filter language does not
//! support are refused here rather than forwarded.

use bson::{Bson, Document, doc};

use countlayer_core::{
    error::{CounterStoreError, CounterStoreResult},
    filter::{Condition, Filter, FilterOp},
};

/// Translates a filter into a MongoDB query document.
///
/// Clauses sharing a field path are folded into `$and`, since a query
/// document can hold each path only once.
///
/// # Errors
///
/// Returns an internal error for conditions carrying an unsupported
/// operator (fail closed, never forward) and a serialization error if an
/// operand cannot be represented as BSON.
pub(crate) fn filter_to_document(filter: &Filter) -> CounterStoreResult<Document> {
    let mut root = Document::new();
    let mut and_terms: Vec<Bson> = Vec::new();

    for clause in &filter.clauses {
        let condition = condition_to_bson(&clause.condition)?;

        if root.contains_key(&clause.path) {
            and_terms.push(Bson::Document(doc! { clause.path.clone(): condition }));
        } else {
            root.insert(clause.path.clone(), condition);
        }
    }

    if !filter.branches.is_empty() {
        root.insert(
            "$or",
            filter
                .branches
                .iter()
                .map(|branch| filter_to_document(branch).map(Bson::Document))
                .collect::<CounterStoreResult<Vec<_>>>()?,
        );
    }

    if !and_terms.is_empty() {
        root.insert("$and", and_terms);
    }

    Ok(root)
}

fn condition_to_bson(condition: &Condition) -> CounterStoreResult<Bson> {
    match condition {
        Condition::Equals(value) => value_to_bson(value),
        Condition::Ops(ops) => {
            let mut document = Document::new();

            for op in ops {
                match op {
                    FilterOp::Gt(operand) => {
                        document.insert("$gt", value_to_bson(operand)?);
                    }
                    FilterOp::Gte(operand) => {
                        document.insert("$gte", value_to_bson(operand)?);
                    }
                    FilterOp::Lt(operand) => {
                        document.insert("$lt", value_to_bson(operand)?);
                    }
                    FilterOp::Lte(operand) => {
                        document.insert("$lte", value_to_bson(operand)?);
                    }
                    FilterOp::In(values) => {
                        document.insert("$in", values_to_bson(values)?);
                    }
                    FilterOp::Nin(values) => {
                        document.insert("$nin", values_to_bson(values)?);
                    }
                    FilterOp::Regex(re) => {
                        document.insert("$regex", re.as_str());
                    }
                    FilterOp::Unsupported(name) => {
                        return Err(CounterStoreError::Internal(format!(
                            "unsupported filter operator {name}"
                        )));
                    }
                }
            }

            Ok(Bson::Document(document))
        }
    }
}

fn value_to_bson(value: &serde_json::Value) -> CounterStoreResult<Bson> {
    bson::ser::serialize_to_bson(value)
        .map_err(|e| CounterStoreError::Internal(e.to_string()))
}

fn values_to_bson(values: &[serde_json::Value]) -> CounterStoreResult<Vec<Bson>> {
    values.iter().map(value_to_bson).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn translate(value: serde_json::Value) -> Document {
        filter_to_document(&Filter::from_value(&value).unwrap()).unwrap()
    }

    #[test]
    fn empty_filter_translates_to_an_empty_document() {
        assert_eq!(translate(json!({})), doc! {});
    }

    #[test]
    fn literal_equality_passes_through() {
        assert_eq!(
            translate(json!({ "meta.status": "active" })),
            doc! { "meta.status": "active" },
        );
    }

    #[test]
    fn operator_conditions_keep_their_keys() {
        assert_eq!(
            translate(json!({ "meta.score": { "$gt": 5, "$lt": 15 } })),
            doc! { "meta.score": { "$gt": 5_i64, "$lt": 15_i64 } },
        );
    }

    #[test]
    fn in_and_nin_carry_their_sequences() {
        // Parsed filters iterate paths in sorted key order.
        assert_eq!(
            translate(json!({ "meta.tag": { "$in": ["a", "c"] }, "meta.kind": { "$nin": [1] } })),
            doc! {
                "meta.kind": { "$nin": [1_i64] },
                "meta.tag": { "$in": ["a", "c"] },
            },
        );
    }

    #[test]
    fn regex_forwards_the_pattern() {
        assert_eq!(
            translate(json!({ "meta.note": { "$regex": "alpha" } })),
            doc! { "meta.note": { "$regex": "alpha" } },
        );
    }

    #[test]
    fn or_branches_translate_recursively() {
        assert_eq!(
            translate(json!({
                "meta.club": "driver",
                "$or": [
                    { "meta.type": "shot" },
                    { "meta.hole": { "$in": [2, 3] } },
                ],
            })),
            doc! {
                "meta.club": "driver",
                "$or": [
                    { "meta.type": "shot" },
                    { "meta.hole": { "$in": [2_i64, 3_i64] } },
                ],
            },
        );
    }

    #[test]
    fn duplicate_paths_fold_into_and() {
        let filter = Filter::new()
            .gt("meta.score", json!(5))
            .lt("meta.score", json!(15));

        assert_eq!(
            filter_to_document(&filter).unwrap(),
            doc! {
                "meta.score": { "$gt": 5_i64 },
                "$and": [ { "meta.score": { "$lt": 15_i64 } } ],
            },
        );
    }

    #[test]
    fn unsupported_operators_are_refused() {
        let filter = Filter::from_value(&json!({ "meta.x": { "$foo": 1 } })).unwrap();
        let err = filter_to_document(&filter).unwrap_err();
        assert_eq!(err.code(), "E_INTERNAL");
    }
}
