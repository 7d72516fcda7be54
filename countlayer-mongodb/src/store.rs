use async_trait::async_trait;
use bson::{Bson, DateTime as BsonDateTime, Document, doc, oid::ObjectId};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use tracing::debug;

use countlayer_core::{
    counter::{Counter, CounterId, CounterInput, CounterMeta, CounterPatch},
    error::{CounterStoreError, CounterStoreResult},
    filter::Filter,
    page::PageOptions,
    store::{CounterBackend, CounterStream},
};

use crate::query::filter_to_document;

/// Names of the database and collection holding the counters.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub database: String,
    pub collection: String,
}

impl CollectionConfig {
    /// Creates a config, failing fast on empty names.
    pub fn new(
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> CounterStoreResult<Self> {
        let database = database.into();
        let collection = collection.into();

        if database.is_empty() || collection.is_empty() {
            return Err(CounterStoreError::Config(
                "database and collection names are required".to_string(),
            ));
        }

        Ok(Self { database, collection })
    }
}

/// Counter store backend over a MongoDB collection.
#[derive(Debug)]
pub struct MongoDbBackend {
    client: Client,
    config: CollectionConfig,
}

impl MongoDbBackend {
    /// Creates a backend over an already-configured client.
    pub fn new(client: Client, config: CollectionConfig) -> Self {
        Self { client, config }
    }

    /// Creates a builder that parses the given connection string.
    pub fn builder(dsn: &str, config: CollectionConfig) -> MongoDbBackendBuilder {
        MongoDbBackendBuilder::new(dsn, config)
    }

    fn collection(&self) -> MongoCollection<Document> {
        self.client
            .database(&self.config.database)
            .collection(&self.config.collection)
    }

    fn object_id(id: &CounterId) -> CounterStoreResult<ObjectId> {
        match id {
            CounterId::Object(oid) => Ok(*oid),
            CounterId::Row(_) => Err(CounterStoreError::Validation(
                "row id passed to the document backend".to_string(),
            )),
        }
    }

    fn meta_to_bson(meta: &CounterMeta) -> CounterStoreResult<Bson> {
        bson::ser::serialize_to_bson(meta)
            .map_err(|e| CounterStoreError::Internal(e.to_string()))
    }

    fn restore_counter(document: &Document) -> CounterStoreResult<Counter> {
        let count = match document.get("count") {
            Some(Bson::Double(value)) => *value,
            Some(Bson::Int32(value)) => *value as f64,
            Some(Bson::Int64(value)) => *value as f64,
            _ => {
                return Err(CounterStoreError::Internal(
                    "counter document is missing a numeric count".to_string(),
                ));
            }
        };

        let created_at = document
            .get_datetime("createdAt")
            .map_err(|e| CounterStoreError::Internal(format!("malformed createdAt: {e}")))?
            .to_chrono();

        let meta = match document.get("meta") {
            Some(Bson::Document(meta)) => {
                bson::de::deserialize_from_bson::<CounterMeta>(Bson::Document(meta.clone()))
                    .map_err(|e| CounterStoreError::Internal(format!("malformed meta: {e}")))?
            }
            _ => {
                return Err(CounterStoreError::Internal(
                    "counter document is missing a meta mapping".to_string(),
                ));
            }
        };

        Ok(Counter { count, created_at, meta })
    }
}

#[async_trait]
impl CounterBackend for MongoDbBackend {
    async fn create(&self, counter: CounterInput) -> CounterStoreResult<CounterId> {
        counter.validate()?;

        let record = counter.into_counter();
        let document = doc! {
            "count": record.count,
            "createdAt": BsonDateTime::from_chrono(record.created_at),
            "meta": Self::meta_to_bson(&record.meta)?,
        };

        let result = self
            .collection()
            .insert_one(document)
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(CounterId::Object(oid)),
            other => Err(CounterStoreError::Internal(format!(
                "unexpected inserted id {other:?}"
            ))),
        }
    }

    async fn get(
        &self,
        filter: &Filter,
        page: Option<PageOptions>,
    ) -> CounterStoreResult<Vec<Counter>> {
        // The server reads a native limit of 0 as "no limit".
        if page.is_some_and(|p| p.limit == Some(0)) {
            return Ok(Vec::new());
        }

        let mut options = FindOptions::default();

        if let Some(page) = page {
            if let Some(limit) = page.limit {
                options.limit = Some(limit as i64);
            }
            if let Some(skip) = page.skip {
                options.skip = Some(skip);
            }
        }

        self.collection()
            .find(filter_to_document(filter)?)
            .with_options(options)
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?
            .iter()
            .map(Self::restore_counter)
            .collect()
    }

    async fn compute(&self, filter: &Filter) -> CounterStoreResult<u64> {
        self.collection()
            .count_documents(filter_to_document(filter)?)
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))
    }

    async fn stream(&self, filter: &Filter) -> CounterStoreResult<CounterStream> {
        let cursor = self
            .collection()
            .find(filter_to_document(filter)?)
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        // Dropping the stream drops the cursor; no further batches are read.
        Ok(cursor
            .map(|item| {
                item.map_err(|e| CounterStoreError::Backend(e.to_string()))
                    .and_then(|document| Self::restore_counter(&document))
            })
            .boxed())
    }

    async fn get_by_id(&self, id: &CounterId) -> CounterStoreResult<Option<Counter>> {
        let oid = Self::object_id(id)?;

        match self
            .collection()
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?
        {
            Some(document) => Ok(Some(Self::restore_counter(&document)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: &CounterId, patch: CounterPatch) -> CounterStoreResult<u64> {
        patch.validate()?;

        if patch.is_empty() {
            return Ok(0);
        }

        let oid = Self::object_id(id)?;
        let mut set = Document::new();

        if let Some(count) = patch.count {
            set.insert("count", count);
        }
        if let Some(created_at) = patch.created_at {
            set.insert("createdAt", BsonDateTime::from_chrono(created_at));
        }
        if let Some(meta) = &patch.meta {
            set.insert("meta", Self::meta_to_bson(meta)?);
        }

        let result = self
            .collection()
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        Ok(result.modified_count)
    }

    async fn delete(&self, id: &CounterId) -> CounterStoreResult<u64> {
        let oid = Self::object_id(id)?;

        let result = self
            .collection()
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        Ok(result.deleted_count)
    }

    async fn delete_all(&self) -> CounterStoreResult<u64> {
        let result = self
            .collection()
            .delete_many(doc! {})
            .await
            .map_err(|e| CounterStoreError::Backend(e.to_string()))?;

        debug!(collection = %self.config.collection, deleted = result.deleted_count, "deleted all counters");

        Ok(result.deleted_count)
    }

    async fn shutdown(&self) -> CounterStoreResult<()> {
        self.client.clone().shutdown().await;

        Ok(())
    }
}

/// Builder that constructs a [`MongoDbBackend`] from a connection string.
pub struct MongoDbBackendBuilder {
    dsn: String,
    config: CollectionConfig,
}

impl MongoDbBackendBuilder {
    pub fn new(dsn: &str, config: CollectionConfig) -> Self {
        Self { dsn: dsn.to_string(), config }
    }

    /// Parses the connection string and constructs the backend.
    ///
    /// The driver connects lazily; an unreachable server surfaces on the
    /// first operation.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the string is empty or does not parse.
    pub async fn build(self) -> CounterStoreResult<MongoDbBackend> {
        if self.dsn.is_empty() {
            return Err(CounterStoreError::Connection(
                "connection string is required".to_string(),
            ));
        }

        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| CounterStoreError::Connection(e.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|e| CounterStoreError::Connection(e.to_string()))?;

        Ok(MongoDbBackend::new(client, self.config))
    }
}
