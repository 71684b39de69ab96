use crate::storage::repository::{strip_identifiers, ID_FIELD};
use crate::storage::{EstablishmentRepository, Record, StorageError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-process store with the same id format and semantics as the MongoDB adapter.
#[derive(Default)]
pub struct MemoryRepository {
    records: RwLock<Vec<(String, Record)>>,
    next_id: AtomicU64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(&self) -> String {
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Ids look like ObjectIds: 24 hex characters.
fn validate_id(id: &str) -> Result<(), StorageError> {
    if id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}

fn with_id(id: &str, record: &Record) -> Record {
    let mut out = record.clone();
    out.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    out
}

#[async_trait]
impl EstablishmentRepository for MemoryRepository {
    async fn list(&self) -> Result<Vec<Record>, StorageError> {
        let records = self.records.read().await;
        Ok(records.iter().map(|(id, r)| with_id(id, r)).collect())
    }

    async fn create(&self, record: Record) -> Result<Record, StorageError> {
        let id = self.assign_id();
        let record = strip_identifiers(record);
        let created = with_id(&id, &record);
        self.records.write().await.push((id, record));
        Ok(created)
    }

    async fn get(&self, id: &str) -> Result<Option<Record>, StorageError> {
        validate_id(id)?;
        let id = id.to_ascii_lowercase();
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(key, r)| with_id(key, r)))
    }

    async fn update(&self, id: &str, fields: Record) -> Result<Option<Record>, StorageError> {
        validate_id(id)?;
        let id = id.to_ascii_lowercase();
        let mut records = self.records.write().await;
        let Some((key, record)) = records.iter_mut().find(|(key, _)| *key == id) else {
            return Ok(None);
        };
        record.extend(strip_identifiers(fields));
        Ok(Some(with_id(key, record)))
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        validate_id(id)?;
        let id = id.to_ascii_lowercase();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|(key, _)| *key != id);
        Ok(records.len() < before)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
