use crate::{BackendError, StoredRecord};
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore {
    async fn count(&self) -> Result<usize, BackendError>;

    async fn delete_all(&self) -> Result<(), BackendError>;

    async fn bulk_insert(&self, records: &[StoredRecord]) -> Result<(), BackendError>;
}
