use crate::traits::VectorStore;
use crate::{BackendError, StoredRecord};
use async_trait::async_trait;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(operation: &str) -> BackendError {
    BackendError::StoreUnavailable(format!("{operation}: memory store lock poisoned"))
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn count(&self) -> Result<usize, BackendError> {
        self.records
            .read()
            .map(|records| records.len())
            .map_err(|_| poisoned("count"))
    }

    async fn delete_all(&self) -> Result<(), BackendError> {
        self.records
            .write()
            .map(|mut records| records.clear())
            .map_err(|_| poisoned("delete"))
    }

    async fn bulk_insert(&self, records: &[StoredRecord]) -> Result<(), BackendError> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| BackendError::StoreWrite("memory store lock poisoned".to_string()))?;
        stored.extend_from_slice(records);
        Ok(())
    }
}
