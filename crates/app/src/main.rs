use chrono::Utc;
use clap::Parser;
use kb_loader_core::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_DATA_DIR, DEFAULT_EMBEDDINGS_URL, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_QUERY_NAME, DEFAULT_TABLE,
};
use kb_loader_core::{
    ApiKey, BatchConfig, BatchLoader, ChunkingConfig, EmbeddingConfig, LoaderConfig,
    OpenAiEmbedder, PostgrestStore, RunSummary, StoreConfig,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "kb-loader", version)]
struct Cli {
    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL", default_value = "")]
    store_url: String,

    /// Service-role key used for bulk delete/insert
    #[arg(long, env = "SUPABASE_SERVICE_KEY", hide_env_values = true)]
    store_key: Option<String>,

    /// Public anon key, used when no service key is set
    #[arg(long, env = "NEXT_PUBLIC_SUPABASE_ANON_KEY", hide_env_values = true)]
    store_anon_key: Option<String>,

    /// Table that holds the document vectors
    #[arg(long, env = "KB_TABLE", default_value = DEFAULT_TABLE)]
    table: String,

    /// Similarity-search function the chat assistant queries
    #[arg(long, env = "KB_QUERY_NAME", default_value = DEFAULT_QUERY_NAME)]
    query_name: String,

    /// Embeddings API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Embeddings API base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_EMBEDDINGS_URL)]
    openai_base_url: String,

    /// Embedding model identifier
    #[arg(long, env = "KB_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Embedding vector dimensions
    #[arg(long, env = "KB_EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// Directory of .txt and .csv sources
    #[arg(long, env = "KB_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Files per batch
    #[arg(long, env = "KB_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Fixed number of batches; computed from the file count when omitted
    #[arg(long, env = "KB_TOTAL_BATCHES")]
    total_batches: Option<usize>,

    /// Batch to start from; the store is only reset when starting at 0
    #[arg(long, env = "KB_START_BATCH", default_value_t = 0)]
    start_batch: usize,

    /// Maximum characters per chunk
    #[arg(long, env = "KB_CHUNK_SIZE", default_value_t = 1_000)]
    chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[arg(long, env = "KB_CHUNK_OVERLAP", default_value_t = 200)]
    chunk_overlap: usize,

    /// Pause between batches, in milliseconds
    #[arg(long, env = "KB_BATCH_DELAY_MS", default_value_t = 2_000)]
    batch_delay_ms: u64,

    /// Per-request timeout for the embeddings and store APIs, in seconds
    #[arg(long, env = "KB_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    request_timeout_secs: u64,
}

impl Cli {
    fn into_config(self) -> LoaderConfig {
        let store_key = non_empty(self.store_key).or_else(|| non_empty(self.store_anon_key));

        LoaderConfig {
            store: StoreConfig {
                url: self.store_url,
                key: store_key.map(ApiKey::new),
                table: self.table,
                query_name: self.query_name,
            },
            embedding: EmbeddingConfig {
                base_url: self.openai_base_url,
                api_key: non_empty(self.openai_api_key).map(ApiKey::new),
                model: self.embedding_model,
                dimensions: self.embedding_dimensions,
            },
            batch: BatchConfig {
                data_dir: self.data_dir,
                batch_size: self.batch_size,
                total_batches: self.total_batches,
                start_batch: self.start_batch,
                batch_delay: Duration::from_millis(self.batch_delay_ms),
            },
            chunking: ChunkingConfig {
                max_chars: self.chunk_size,
                overlap_chars: self.chunk_overlap,
            },
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    // Missing files are fine; values already in the environment win.
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let config = Cli::parse().into_config();
    if let Err(error) = config.validate() {
        error!(%error, "invalid configuration");
        return Err(error.into());
    }

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        store_url = %config.store.url,
        table = %config.store.table,
        query_name = %config.store.query_name,
        model = %config.embedding.model,
        embeddings_key = %config.embedding.api_key.as_ref().map(ApiKey::masked).unwrap_or_default(),
        "kb-loader boot"
    );

    let embedder = OpenAiEmbedder::new(&config.embedding, config.request_timeout)?;
    let store = PostgrestStore::new(&config.store, config.request_timeout)?;
    let mut loader = BatchLoader::new(config, embedder, store);

    let summary = match loader.load_directory().await {
        Ok(summary) => summary,
        Err(error) => {
            match error.batch_index() {
                Some(batch_index) => eprintln!("batch {batch_index} failed: {error}"),
                None => eprintln!("load failed: {error}"),
            }
            eprintln!("stopping execution due to error");
            return Err(error.into());
        }
    };

    print_summary(&summary, &loader.config().store.table);
    Ok(())
}

fn print_summary(summary: &RunSummary, table: &str) {
    println!("summary (run {})", summary.run_id);
    println!("{}", "-".repeat(60));
    for batch in &summary.batches {
        println!(
            "  batch {}: {} files, {} documents, {} chunks ({:.1}s)",
            batch.batch_index,
            batch.file_count,
            batch.document_count,
            batch.chunk_count,
            batch.duration_seconds()
        );
    }
    println!("{}", "-".repeat(60));
    if summary.deleted_records() > 0 {
        println!("records replaced: {}", summary.deleted_records());
    }
    println!("files processed: {}", summary.total_files());
    println!("documents loaded: {}", summary.total_documents());
    println!("chunks stored: {}", summary.total_chunks());
    println!("total time: {:.1}s", summary.elapsed.as_secs_f64());
    println!(
        "verify with: SELECT COUNT(*) FROM {table}; expected ~{} rows",
        summary.total_chunks()
    );
}
