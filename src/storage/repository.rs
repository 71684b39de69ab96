use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

/// An establishment record: an open field map. Records handed out by a
/// repository always carry their identifier as a string `id` field.
pub type Record = Map<String, Value>;

/// Field holding the public identifier
pub const ID_FIELD: &str = "id";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid establishment id: {0}")]
    InvalidId(String),

    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("storage error: {0}")]
    Backend(String),
}

/// Persistence for establishment records, keyed by string ids.
#[async_trait]
pub trait EstablishmentRepository: Send + Sync {
    /// Every record, in store order.
    async fn list(&self) -> Result<Vec<Record>, StorageError>;

    /// Insert a record and return it as stored, with its assigned id.
    async fn create(&self, record: Record) -> Result<Record, StorageError>;

    async fn get(&self, id: &str) -> Result<Option<Record>, StorageError>;

    /// Overwrite only the given fields. `None` when no record has this id.
    async fn update(&self, id: &str, fields: Record) -> Result<Option<Record>, StorageError>;

    /// `false` when no record has this id.
    async fn delete(&self, id: &str) -> Result<bool, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;
}

/// Drop client-supplied identifiers; ids are assigned by the store and immutable.
pub(crate) fn strip_identifiers(mut record: Record) -> Record {
    record.remove(ID_FIELD);
    record.remove("_id");
    record
}
