use crate::config::{ApiKey, EmbeddingConfig};
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const MAX_INPUTS_PER_REQUEST: usize = 512;

#[async_trait]
pub trait EmbeddingService {
    fn model(&self) -> &str;
    fn dimensions(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: ApiKey,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig, timeout: Duration) -> Result<Self, BackendError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            BackendError::EmbeddingService("embedding API key is not configured".to_string())
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| BackendError::EmbeddingService(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|error| {
                BackendError::from_transport(
                    "embeddings request",
                    error,
                    BackendError::EmbeddingService,
                )
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            BackendError::from_transport(
                "embeddings response",
                error,
                BackendError::EmbeddingService,
            )
        })?;

        if !status.is_success() {
            return Err(BackendError::EmbeddingService(format!(
                "{status}: {}",
                body.trim()
            )));
        }

        parse_embedding_response(&body, texts.len())
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_INPUTS_PER_REQUEST) {
            debug!(inputs = batch.len(), model = %self.model, "requesting embeddings");
            vectors.extend(self.embed_request(batch).await?);
        }
        Ok(vectors)
    }
}

fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, BackendError> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body).map_err(|error| {
        BackendError::EmbeddingService(format!("malformed embeddings response: {error}"))
    })?;

    if parsed.data.len() != expected {
        return Err(BackendError::EmbeddingService(format!(
            "expected {expected} embeddings, got {}",
            parsed.data.len()
        )));
    }

    parsed.data.sort_by_key(|item| item.index);
    Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
}

#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    pub dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimensions: 128 }
    }
}

impl HashingEmbedder {
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        for window in chars.windows(3) {
            let mut hash = 1469598103934665603u64;
            for character in window {
                hash ^= *character as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl EmbeddingService for HashingEmbedder {
    fn model(&self) -> &str {
        "hashing-trigram"
    }

    fn dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}
