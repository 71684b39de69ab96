use crate::config::StorageConfig;
use crate::storage::repository::{strip_identifiers, ID_FIELD};
use crate::storage::{EstablishmentRepository, Record, StorageError};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde_json::Value;
use std::future::IntoFuture;
use std::time::Duration;
use tracing::{debug, info};

impl From<mongodb::error::Error> for StorageError {
    fn from(e: mongodb::error::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// MongoDB-backed establishment store
pub struct MongoRepository {
    database: Database,
    collection: Collection<Document>,
    operation_timeout: Duration,
}

impl MongoRepository {
    /// Build the client once; the driver connects lazily and pools connections.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.server_selection_timeout = Some(config.connect_timeout());
        options.connect_timeout = Some(config.connect_timeout());

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        let collection = database.collection::<Document>(&config.collection);

        info!(
            database = %config.database,
            collection = %config.collection,
            "MongoDB client created"
        );

        Ok(Self {
            database,
            collection,
            operation_timeout: config.operation_timeout(),
        })
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, StorageError>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        tokio::time::timeout(self.operation_timeout, operation)
            .await
            .map_err(|_| StorageError::Timeout(self.operation_timeout))?
            .map_err(StorageError::from)
    }

    async fn find_by_oid(&self, oid: ObjectId) -> Result<Option<Record>, StorageError> {
        let found = self.bounded(self.collection.find_one(doc! { "_id": oid })).await?;
        Ok(found.map(into_record))
    }
}

#[async_trait]
impl EstablishmentRepository for MongoRepository {
    async fn list(&self) -> Result<Vec<Record>, StorageError> {
        let cursor = self.bounded(self.collection.find(doc! {})).await?;
        let documents: Vec<Document> = self.bounded(cursor.try_collect()).await?;
        debug!(count = documents.len(), "Listed establishments");
        Ok(documents.into_iter().map(into_record).collect())
    }

    async fn create(&self, record: Record) -> Result<Record, StorageError> {
        let document = to_document(strip_identifiers(record))?;
        let inserted = self.bounded(self.collection.insert_one(document)).await?;

        let oid = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StorageError::Backend("insert returned a non-ObjectId id".to_string()))?;

        self.find_by_oid(oid)
            .await?
            .ok_or_else(|| StorageError::Backend(format!("inserted record {oid} was not found")))
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, StorageError> {
        self.find_by_oid(parse_object_id(id)?).await
    }

    async fn update(&self, id: &str, fields: Record) -> Result<Option<Record>, StorageError> {
        let oid = parse_object_id(id)?;
        let fields = strip_identifiers(fields);

        // `$set` rejects an empty document
        if fields.is_empty() {
            return self.find_by_oid(oid).await;
        }

        let set = to_document(fields)?;
        let update = doc! { "$set": set };
        let result = self
            .bounded(self.collection.update_one(doc! { "_id": oid }, update))
            .await?;
        if result.matched_count == 0 {
            return Ok(None);
        }

        self.find_by_oid(oid).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let oid = parse_object_id(id)?;
        let result = self.bounded(self.collection.delete_one(doc! { "_id": oid })).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.bounded(self.database.run_command(doc! { "ping": 1 }))
            .await
            .map(|_| ())
    }
}

fn parse_object_id(id: &str) -> Result<ObjectId, StorageError> {
    ObjectId::parse_str(id).map_err(|_| StorageError::InvalidId(id.to_string()))
}

fn to_document(record: Record) -> Result<Document, StorageError> {
    bson::to_document(&record).map_err(|e| StorageError::Backend(e.to_string()))
}

/// Convert a stored document to a record, replacing `_id` with a string `id`.
fn into_record(mut document: Document) -> Record {
    let id = document.remove("_id");

    let mut record = match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Record::new(),
    };

    if let Some(id) = id {
        record.insert(ID_FIELD.to_string(), Value::String(id_to_string(&id)));
    }
    record
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}
