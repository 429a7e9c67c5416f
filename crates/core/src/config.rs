use crate::chunking::ChunkingConfig;
use crate::error::IngestError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TABLE: &str = "documents";
pub const DEFAULT_QUERY_NAME: &str = "match_documents";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
pub const DEFAULT_EMBEDDINGS_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_DATA_DIR: &str = "data/text_csv";
pub const DEFAULT_BATCH_SIZE: usize = 3;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(2_000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub key: Option<ApiKey>,
    pub table: String,
    pub query_name: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub data_dir: PathBuf,
    pub batch_size: usize,
    pub total_batches: Option<usize>,
    pub start_batch: usize,
    pub batch_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub batch: BatchConfig,
    pub chunking: ChunkingConfig,
    pub request_timeout: Duration,
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.store.key.is_none() {
            return Err(IngestError::Configuration(
                "vector store key missing (set SUPABASE_SERVICE_KEY or NEXT_PUBLIC_SUPABASE_ANON_KEY)"
                    .to_string(),
            ));
        }
        if self.embedding.api_key.is_none() {
            return Err(IngestError::Configuration(
                "embedding API key missing (set OPENAI_API_KEY)".to_string(),
            ));
        }

        parse_endpoint("vector store url", &self.store.url)?;
        parse_endpoint("embeddings url", &self.embedding.base_url)?;

        if self.store.table.trim().is_empty() {
            return Err(IngestError::Configuration("table name is empty".to_string()));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(IngestError::Configuration(
                "embedding model is empty".to_string(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(IngestError::Configuration(
                "embedding dimensions must be positive".to_string(),
            ));
        }
        if self.batch.batch_size == 0 {
            return Err(IngestError::Configuration(
                "batch size must be positive".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(IngestError::Configuration(
                "request timeout must be positive".to_string(),
            ));
        }

        self.chunking.validate()
    }

    pub fn planned_batches(&self, file_count: usize) -> usize {
        self.batch
            .total_batches
            .unwrap_or_else(|| crate::batch::batch_count(file_count, self.batch.batch_size))
    }
}

fn parse_endpoint(label: &str, value: &str) -> Result<Url, IngestError> {
    if value.trim().is_empty() {
        return Err(IngestError::Configuration(format!("{label} missing")));
    }
    let url = Url::parse(value)
        .map_err(|error| IngestError::Configuration(format!("{label} is invalid: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(IngestError::Configuration(format!(
            "{label} must use http or https: {value}"
        )));
    }
    Ok(url)
}

#[cfg(test)]
pub(crate) fn test_config() -> LoaderConfig {
    LoaderConfig {
        store: StoreConfig {
            url: "https://example.supabase.co".to_string(),
            key: Some(ApiKey::new("service-key")),
            table: DEFAULT_TABLE.to_string(),
            query_name: DEFAULT_QUERY_NAME.to_string(),
        },
        embedding: EmbeddingConfig {
            base_url: DEFAULT_EMBEDDINGS_URL.to_string(),
            api_key: Some(ApiKey::new("sk-test")),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        },
        batch: BatchConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            total_batches: None,
            start_batch: 0,
            batch_delay: Duration::ZERO,
        },
        chunking: ChunkingConfig::default(),
        request_timeout: DEFAULT_REQUEST_TIMEOUT,
    }
}
