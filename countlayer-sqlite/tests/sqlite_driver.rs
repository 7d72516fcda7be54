//! Tests for the rusqlite-backed row driver, including file persistence.

use serde_json::{Value, json};

use countlayer_core::{counter::CounterInput, filter::Filter, store::CounterStore};
use countlayer_sqlite::{SqliteBackend, SqliteDriver};

fn input(count: f64, value: Value) -> CounterInput {
    let Value::Object(map) = value else {
        panic!("meta must be an object");
    };
    CounterInput::new(count, map)
}

#[tokio::test]
async fn in_memory_database_round_trips() {
    let driver = SqliteDriver::open_in_memory().unwrap();
    let store = CounterStore::new(SqliteBackend::new(driver));

    let id = store
        .create(input(2.5, json!({ "status": "active" })))
        .await
        .unwrap();

    let found = store.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(found.count, 2.5);
    assert_eq!(found.meta.get("status"), Some(&json!("active")));
}

#[tokio::test]
async fn filters_apply_over_real_rows() {
    let driver = SqliteDriver::open_in_memory().unwrap();
    let store = CounterStore::new(SqliteBackend::new(driver));

    for score in [5, 10, 15] {
        store.create(input(1.0, json!({ "score": score }))).await.unwrap();
    }

    let filter = Filter::from_value(&json!({
        "meta.score": { "$gt": 5, "$lt": 15 },
    }))
    .unwrap();

    let matched = store.get(&filter, None).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].meta.get("score"), Some(&json!(10)));
}

#[tokio::test]
async fn file_backed_rows_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counters.sqlite3");

    {
        let store = CounterStore::new(SqliteBackend::new(SqliteDriver::open(&path).unwrap()));
        store.create(input(1.0, json!({ "n": 1 }))).await.unwrap();
        store.create(input(2.0, json!({ "n": 2 }))).await.unwrap();
        store.shutdown().await.unwrap();
    }

    let reopened = CounterStore::new(SqliteBackend::new(SqliteDriver::open(&path).unwrap()));
    let all = reopened.get(&Filter::new(), None).await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all[0].count, 1.0);
    assert_eq!(all[1].count, 2.0);
}

#[tokio::test]
async fn custom_tables_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counters.sqlite3");

    let shots = CounterStore::new(
        SqliteBackend::with_table(SqliteDriver::open(&path).unwrap(), "shots").unwrap(),
    );
    let rounds = CounterStore::new(
        SqliteBackend::with_table(SqliteDriver::open(&path).unwrap(), "rounds").unwrap(),
    );

    shots.create(input(1.0, json!({}))).await.unwrap();

    assert_eq!(shots.compute(&Filter::new()).await.unwrap(), 1);
    assert_eq!(rounds.compute(&Filter::new()).await.unwrap(), 0);
}
