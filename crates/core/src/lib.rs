pub mod batch;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod sink;
pub mod stores;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use batch::{batch_count, plan_batch, unplanned_files};
pub use chunking::{split_documents, split_text, ChunkingConfig};
pub use config::{ApiKey, BatchConfig, EmbeddingConfig, LoaderConfig, StoreConfig};
pub use embeddings::{EmbeddingService, HashingEmbedder, OpenAiEmbedder};
pub use error::{BackendError, IngestError, RunError, StageError};
pub use ingest::discover_source_files;
pub use models::{
    BatchResult, Chunk, Metadata, RawDocument, RunSummary, SourceFile, SourceKind, StoredRecord,
};
pub use orchestrator::{BatchLoader, ResetGuard, RunState};
pub use parser::{parse_source_file, CsvParser, DocumentParser, TextParser};
pub use sink::{store_chunks, RunStamp};
pub use stores::{MemoryStore, PostgrestStore};
pub use traits::VectorStore;
