use crate::batch::{plan_batch, unplanned_files};
use crate::chunking::split_documents;
use crate::config::LoaderConfig;
use crate::embeddings::EmbeddingService;
use crate::ingest::discover_source_files;
use crate::parser::parse_source_file;
use crate::sink::{store_chunks, RunStamp};
use crate::traits::VectorStore;
use crate::{BackendError, BatchResult, RunError, RunSummary, SourceFile, StageError};
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(usize),
    Completed,
    Failed(usize),
}

#[derive(Debug)]
pub struct ResetGuard(());

impl ResetGuard {
    fn for_start(start_batch: usize) -> Option<Self> {
        (start_batch == 0).then_some(ResetGuard(()))
    }

    pub async fn clear<S>(self, store: &S) -> Result<usize, BackendError>
    where
        S: VectorStore + Sync + ?Sized,
    {
        let existing = store.count().await?;
        if existing == 0 {
            info!("no existing records to delete");
            return Ok(0);
        }

        info!(existing, "deleting existing records");
        store.delete_all().await?;
        info!(deleted = existing, "store reset complete");
        Ok(existing)
    }
}

pub struct BatchLoader<E, S>
where
    E: EmbeddingService,
    S: VectorStore,
{
    config: LoaderConfig,
    embedder: E,
    store: S,
    state: RunState,
}

impl<E, S> BatchLoader<E, S>
where
    E: EmbeddingService + Send + Sync,
    S: VectorStore + Send + Sync,
{
    pub fn new(config: LoaderConfig, embedder: E, store: S) -> Self {
        Self {
            config,
            embedder,
            store,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub async fn load_directory(&mut self) -> Result<RunSummary, RunError> {
        let folder = self.config.batch.data_dir.clone();
        let files = discover_source_files(&folder).map_err(|error| {
            error!(folder = %folder.display(), %error, "discovery failed");
            RunError::Discovery(error)
        })?;

        info!(
            folder = %folder.display(),
            count = files.len(),
            files = ?files.iter().map(|file| file.name.as_str()).collect::<Vec<_>>(),
            "discovered source files"
        );

        self.run(&files).await
    }

    pub async fn run(&mut self, files: &[SourceFile]) -> Result<RunSummary, RunError> {
        let started = Instant::now();
        let stamp = RunStamp::new();
        let total = self.config.planned_batches(files.len());
        let first = self.config.batch.start_batch;
        let mut reset = ResetGuard::for_start(first);
        let mut batches = Vec::new();

        info!(
            run_id = %stamp.run_id,
            total_batches = total,
            start_batch = first,
            batch_size = self.config.batch.batch_size,
            "starting load"
        );

        let skipped = unplanned_files(files, total, self.config.batch.batch_size);
        if !skipped.is_empty() {
            warn!(
                total_batches = total,
                skipped = ?skipped.iter().map(|file| file.name.as_str()).collect::<Vec<_>>(),
                "batch plan does not cover every file"
            );
        }

        for batch_index in first..total {
            self.state = RunState::Running(batch_index);
            // Only the first iteration can hold the token; it is dropped afterwards either way.
            let guard = reset.take();

            match self.run_batch(batch_index, files, guard, &stamp).await {
                Ok(result) => batches.push(result),
                Err(source) => {
                    self.state = RunState::Failed(batch_index);
                    error!(batch_index, error = %source, "batch failed, stopping");
                    return Err(RunError::Batch {
                        batch_index,
                        source,
                    });
                }
            }

            if batch_index + 1 < total && !self.config.batch.batch_delay.is_zero() {
                info!(
                    delay_ms = self.config.batch.batch_delay.as_millis() as u64,
                    "waiting before next batch"
                );
                sleep(self.config.batch.batch_delay).await;
            }
        }

        self.state = RunState::Completed;
        let summary = RunSummary {
            run_id: stamp.run_id,
            batches,
            elapsed: started.elapsed(),
        };

        info!(
            files = summary.total_files(),
            documents = summary.total_documents(),
            chunks = summary.total_chunks(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "all batches completed"
        );

        Ok(summary)
    }

    async fn run_batch(
        &self,
        batch_index: usize,
        files: &[SourceFile],
        reset: Option<ResetGuard>,
        stamp: &RunStamp,
    ) -> Result<BatchResult, StageError> {
        let started = Instant::now();
        let batch_size = self.config.batch.batch_size;
        let selected = plan_batch(files, batch_index, batch_size);

        if selected.is_empty() {
            info!(batch_index, "no files in batch, skipping");
            return Ok(BatchResult::empty(batch_index));
        }

        info!(
            batch_index,
            first = batch_index * batch_size + 1,
            last = batch_index * batch_size + selected.len(),
            of = files.len(),
            files = ?selected.iter().map(|file| file.name.as_str()).collect::<Vec<_>>(),
            "loading batch"
        );

        let deleted_records = match reset {
            Some(guard) => Some(guard.clear(&self.store).await?),
            None => {
                info!(batch_index, "skipping reset, not the first batch");
                None
            }
        };

        let mut documents = Vec::new();
        for file in selected {
            let parsed = parse_source_file(file)?;
            let characters: usize = parsed
                .iter()
                .map(|document| document.content.chars().count())
                .sum();
            info!(
                batch_index,
                file = %file.name,
                documents = parsed.len(),
                characters,
                "parsed source file"
            );
            documents.extend(parsed);
        }

        let chunks = split_documents(&documents, self.config.chunking);
        info!(
            batch_index,
            documents = documents.len(),
            chunks = chunks.len(),
            "split documents"
        );

        store_chunks(&self.embedder, &self.store, &chunks, stamp).await?;

        let result = BatchResult {
            batch_index,
            file_count: selected.len(),
            document_count: documents.len(),
            chunk_count: chunks.len(),
            deleted_records,
            duration: started.elapsed(),
        };
        info!(
            batch_index,
            duration_ms = result.duration.as_millis() as u64,
            "batch completed"
        );

        Ok(result)
    }
}
