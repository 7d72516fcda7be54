//! Contract tests for the embedded row backend over the in-memory driver.

use bson::oid::ObjectId;
use chrono::Utc;
use futures::StreamExt;
use serde_json::{Value, json};

use countlayer_core::{
    counter::{CounterId, CounterInput, CounterMeta, CounterPatch},
    filter::Filter,
    page::PageOptions,
    store::CounterStore,
};
use countlayer_sqlite::{MemoryDriver, SqliteBackend};

fn meta(value: Value) -> CounterMeta {
    let Value::Object(map) = value else {
        panic!("meta must be an object");
    };
    map
}

fn input(count: f64, value: Value) -> CounterInput {
    CounterInput::new(count, meta(value))
}

fn store() -> CounterStore<SqliteBackend> {
    CounterStore::new(SqliteBackend::new(MemoryDriver::new()))
}

#[tokio::test]
async fn create_then_get_by_id_round_trips() {
    let store = store();
    let created_at = Utc::now();

    let id = store
        .create(input(3.0, json!({ "status": "active", "nested": { "k": [1, 2] } }))
            .with_created_at(created_at))
        .await
        .unwrap();

    assert!(matches!(id, CounterId::Row(_)));

    let found = store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(found.count, 3.0);
    assert_eq!(found.meta, meta(json!({ "status": "active", "nested": { "k": [1, 2] } })));
    assert_eq!(found.created_at.timestamp_millis(), created_at.timestamp_millis());
}

#[tokio::test]
async fn get_by_unknown_id_returns_none() {
    let store = store();
    assert!(store.get_by_id(&CounterId::Row(41)).await.unwrap().is_none());
}

#[tokio::test]
async fn document_ids_are_rejected() {
    let store = store();
    let err = store
        .get_by_id(&CounterId::Object(ObjectId::new()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E_VALIDATION");
}

#[tokio::test]
async fn compute_equals_unpaginated_get_length() {
    let store = store();

    for hole in 1..=6 {
        store
            .create(input(1.0, json!({ "hole": hole, "par": hole % 2 })))
            .await
            .unwrap();
    }

    let filter = Filter::from_value(&json!({ "meta.par": 1 })).unwrap();
    let fetched = store.get(&filter, None).await.unwrap();
    let computed = store.compute(&filter).await.unwrap();

    assert_eq!(computed, fetched.len() as u64);
    assert_eq!(computed, 3);
}

#[tokio::test]
async fn pagination_windows_partition_the_result_set() {
    let store = store();

    for i in 0..10 {
        store.create(input(i as f64, json!({ "i": i }))).await.unwrap();
    }

    let all = store.get(&Filter::new(), None).await.unwrap();
    assert_eq!(all.len(), 10);

    let first = store
        .get(&Filter::new(), Some(PageOptions::new().with_limit(4)))
        .await
        .unwrap();
    let rest = store
        .get(&Filter::new(), Some(PageOptions::new().with_skip(4)))
        .await
        .unwrap();

    assert_eq!(first.len(), 4);
    assert_eq!(rest.len(), 6);

    let mut joined = first;
    joined.extend(rest);
    assert_eq!(joined, all);
}

#[tokio::test]
async fn zero_limit_returns_nothing() {
    let store = store();
    store.create(input(1.0, json!({}))).await.unwrap();

    let page = store
        .get(&Filter::new(), Some(PageOptions::new().with_limit(0)))
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn update_replaces_only_supplied_fields() {
    let store = store();
    let created_at = Utc::now();

    let id = store
        .create(input(1.0, json!({ "status": "active" })).with_created_at(created_at))
        .await
        .unwrap();

    let changed = store
        .update(&id, CounterPatch::new().count(9.0))
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let after = store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(after.count, 9.0);
    assert_eq!(after.meta, meta(json!({ "status": "active" })));
    assert_eq!(after.created_at.timestamp_millis(), created_at.timestamp_millis());
}

#[tokio::test]
async fn empty_patch_updates_nothing() {
    let store = store();
    let id = store.create(input(1.0, json!({ "keep": true }))).await.unwrap();
    let before = store.get_by_id(&id).await.unwrap().unwrap();

    let changed = store.update(&id, CounterPatch::new()).await.unwrap();
    assert_eq!(changed, 0);

    let after = store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn update_of_unknown_id_returns_zero() {
    let store = store();
    let changed = store
        .update(&CounterId::Row(404), CounterPatch::new().count(1.0))
        .await
        .unwrap();
    assert_eq!(changed, 0);
    assert_eq!(store.compute(&Filter::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn meta_updates_replace_the_mapping_wholesale() {
    let store = store();
    let id = store
        .create(input(1.0, json!({ "a": 1, "b": 2 })))
        .await
        .unwrap();

    store
        .update(&id, CounterPatch::new().meta(meta(json!({ "c": 3 }))))
        .await
        .unwrap();

    let after = store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(after.meta, meta(json!({ "c": 3 })));
}

#[tokio::test]
async fn deleting_a_nonexistent_id_is_a_zero_not_an_error() {
    let store = store();
    assert_eq!(store.delete(&CounterId::Row(7)).await.unwrap(), 0);

    let id = store.create(input(1.0, json!({}))).await.unwrap();
    assert_eq!(store.delete(&id).await.unwrap(), 1);
    assert_eq!(store.delete(&id).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_all_reports_the_count() {
    let store = store();

    for i in 0..5 {
        store.create(input(i as f64, json!({}))).await.unwrap();
    }

    assert_eq!(store.delete_all().await.unwrap(), 5);
    assert_eq!(store.delete_all().await.unwrap(), 0);
    assert!(store.get(&Filter::new(), None).await.unwrap().is_empty());
}

#[tokio::test]
async fn stream_yields_the_same_records_as_get() {
    let store = store();

    for i in 0..4 {
        store.create(input(i as f64, json!({ "even": i % 2 == 0 }))).await.unwrap();
    }

    let filter = Filter::from_value(&json!({ "meta.even": true })).unwrap();
    let fetched = store.get(&filter, None).await.unwrap();

    let streamed = store
        .stream(&filter)
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(streamed, fetched);
}

#[tokio::test]
async fn stream_supports_early_termination() {
    let store = store();

    for i in 0..10 {
        store.create(input(i as f64, json!({}))).await.unwrap();
    }

    let mut stream = store.stream(&Filter::new()).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.count, 0.0);
    drop(stream);

    // The store is unaffected by the abandoned stream.
    assert_eq!(store.compute(&Filter::new()).await.unwrap(), 10);
}

#[tokio::test]
async fn rejected_inputs_persist_nothing() {
    let store = store();

    let err = store.create(input(f64::NAN, json!({}))).await.unwrap_err();
    assert_eq!(err.code(), "E_VALIDATION");
    assert_eq!(store.compute(&Filter::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn table_names_are_validated() {
    assert!(SqliteBackend::with_table(MemoryDriver::new(), "").is_err());
    assert!(SqliteBackend::with_table(MemoryDriver::new(), "x; drop table y").is_err());
    assert!(SqliteBackend::with_table(MemoryDriver::new(), "scores_2024").is_ok());
}

#[tokio::test]
async fn concurrent_creates_each_get_distinct_ids() {
    let store = std::sync::Arc::new(store());

    let handles = (0..8)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.create(input(i as f64, json!({}))).await })
        })
        .collect::<Vec<_>>();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }

    ids.sort_by_key(|id| match id {
        CounterId::Row(id) => *id,
        CounterId::Object(_) => unreachable!(),
    });
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(store.compute(&Filter::new()).await.unwrap(), 8);
}
