use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("data directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn parse(
        file: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    #[error("vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("vector store write failed: {0}")]
    StoreWrite(String),

    #[error("{operation} timed out")]
    Timeout { operation: String },
}

impl BackendError {
    pub(crate) fn from_transport(
        operation: &str,
        error: reqwest::Error,
        wrap: fn(String) -> BackendError,
    ) -> Self {
        if error.is_timeout() {
            BackendError::Timeout {
                operation: operation.to_string(),
            }
        } else {
            wrap(format!("{operation}: {error}"))
        }
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("discovery failed: {0}")]
    Discovery(#[source] IngestError),

    #[error("batch {batch_index} failed: {source}")]
    Batch {
        batch_index: usize,
        #[source]
        source: StageError,
    },
}

impl RunError {
    pub fn batch_index(&self) -> Option<usize> {
        match self {
            RunError::Discovery(_) => None,
            RunError::Batch { batch_index, .. } => Some(*batch_index),
        }
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
