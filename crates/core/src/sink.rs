use crate::embeddings::EmbeddingService;
use crate::traits::VectorStore;
use crate::{BackendError, Chunk, StoredRecord};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RunStamp {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunStamp {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
        }
    }
}

impl Default for RunStamp {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn store_chunks<E, S>(
    embedder: &E,
    store: &S,
    chunks: &[Chunk],
    stamp: &RunStamp,
) -> Result<usize, BackendError>
where
    E: EmbeddingService + Sync + ?Sized,
    S: VectorStore + Sync + ?Sized,
{
    if chunks.is_empty() {
        return Ok(0);
    }

    let texts = chunks
        .iter()
        .map(|chunk| chunk.text.clone())
        .collect::<Vec<_>>();
    let embeddings = embedder.embed(&texts).await?;

    if embeddings.len() != chunks.len() {
        return Err(BackendError::EmbeddingService(format!(
            "embedding count {} doesn't match chunk count {}",
            embeddings.len(),
            chunks.len()
        )));
    }

    let records = chunks
        .iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| {
            if embedding.len() != embedder.dimensions() {
                return Err(BackendError::EmbeddingService(format!(
                    "embedding dimension {} != {}",
                    embedding.len(),
                    embedder.dimensions()
                )));
            }
            Ok(build_record(chunk, embedding, stamp))
        })
        .collect::<Result<Vec<_>, BackendError>>()?;

    store.bulk_insert(&records).await?;
    info!(records = records.len(), model = embedder.model(), "stored embeddings");

    Ok(records.len())
}

pub fn build_record(chunk: &Chunk, embedding: Vec<f32>, stamp: &RunStamp) -> StoredRecord {
    let id = make_record_id(chunk);

    let mut metadata = chunk
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect::<Map<String, Value>>();
    metadata.insert("chunk_id".to_string(), Value::String(id.clone()));
    metadata.insert("chunk_index".to_string(), json!(chunk.chunk_index));
    metadata.insert(
        "loc".to_string(),
        json!({ "char_start": chunk.char_start, "char_end": chunk.char_end }),
    );
    metadata.insert("run_id".to_string(), Value::String(stamp.run_id.clone()));
    metadata.insert(
        "loaded_at".to_string(),
        Value::String(stamp.started_at.to_rfc3339()),
    );

    StoredRecord {
        id,
        content: chunk.text.clone(),
        embedding,
        metadata: Value::Object(metadata),
    }
}

fn make_record_id(chunk: &Chunk) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in &chunk.metadata {
        hasher.update(key.as_bytes());
        hasher.update([0]);
        hasher.update(value.as_bytes());
        hasher.update([0]);
    }
    hasher.update((chunk.document_index as u64).to_le_bytes());
    hasher.update((chunk.chunk_index as u64).to_le_bytes());
    hasher.update(chunk.text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use crate::models::Metadata;
    use crate::stores::MemoryStore;
    use async_trait::async_trait;

    fn chunk(text: &str, index: usize) -> Chunk {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "rooms.txt".to_string());
        Chunk {
            text: text.to_string(),
            chunk_index: index,
            char_start: index * 10,
            char_end: index * 10 + text.chars().count(),
            document_index: 0,
            metadata,
        }
    }

    struct WrongDimensions;

    #[async_trait]
    impl EmbeddingService for WrongDimensions {
        fn model(&self) -> &str {
            "wrong"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
            Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl VectorStore for FailingStore {
        async fn count(&self) -> Result<usize, BackendError> {
            Ok(0)
        }

        async fn delete_all(&self) -> Result<(), BackendError> {
            Ok(())
        }

        async fn bulk_insert(&self, _records: &[StoredRecord]) -> Result<(), BackendError> {
            Err(BackendError::StoreWrite("insert rejected".to_string()))
        }
    }

    #[tokio::test]
    async fn chunks_are_embedded_and_stored() -> Result<(), BackendError> {
        let store = MemoryStore::new();
        let stamp = RunStamp::new();
        let chunks = vec![chunk("Sauna room", 0), chunk("Steam room", 1)];

        let written = store_chunks(&HashingEmbedder::default(), &store, &chunks, &stamp).await?;

        assert_eq!(written, 2);
        let records = store.records();
        assert_eq!(records[1].content, "Steam room");
        assert_eq!(records[1].embedding.len(), 128);
        assert_eq!(records[1].metadata["source"], "rooms.txt");
        assert_eq!(records[1].metadata["run_id"], stamp.run_id.as_str());
        assert_eq!(records[1].metadata["loc"]["char_start"], 10);
        assert_ne!(records[0].id, records[1].id);
        Ok(())
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() -> Result<(), BackendError> {
        let written =
            store_chunks(&WrongDimensions, &FailingStore, &[], &RunStamp::new()).await?;
        assert_eq!(written, 0);
        Ok(())
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_embedding_error() {
        let store = MemoryStore::new();
        let result =
            store_chunks(&WrongDimensions, &store, &[chunk("x", 0)], &RunStamp::new()).await;
        assert!(matches!(result, Err(BackendError::EmbeddingService(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn insert_failure_is_a_store_write_error() {
        let result = store_chunks(
            &HashingEmbedder::default(),
            &FailingStore,
            &[chunk("x", 0)],
            &RunStamp::new(),
        )
        .await;
        assert!(matches!(result, Err(BackendError::StoreWrite(_))));
    }

    #[test]
    fn record_ids_are_deterministic() {
        let first = build_record(&chunk("Jacuzzi", 0), vec![1.0], &RunStamp::new());
        let second = build_record(&chunk("Jacuzzi", 0), vec![1.0], &RunStamp::new());
        assert_eq!(first.id, second.id);
        assert_ne!(first.metadata["run_id"], second.metadata["run_id"]);
    }
}
