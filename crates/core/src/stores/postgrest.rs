use crate::config::{ApiKey, StoreConfig};
use crate::traits::VectorStore;
use crate::{BackendError, StoredRecord};
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub struct PostgrestStore {
    client: Client,
    endpoint: String,
    key: ApiKey,
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    content: &'a str,
    embedding: &'a [f32],
    metadata: &'a Value,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig, timeout: Duration) -> Result<Self, BackendError> {
        let key = config.key.clone().ok_or_else(|| {
            BackendError::StoreUnavailable("vector store key is not configured".to_string())
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| BackendError::StoreUnavailable(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                config.url.trim_end_matches('/'),
                config.table
            ),
            key,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.key.expose())
            .bearer_auth(self.key.expose())
    }

    async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
        wrap: fn(String) -> BackendError,
    ) -> Result<Response, BackendError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|error| BackendError::from_transport(operation, error, wrap))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(wrap(format!("{operation} returned {status}: {}", body.trim())))
    }
}

#[async_trait]
impl VectorStore for PostgrestStore {
    async fn count(&self) -> Result<usize, BackendError> {
        let request = self
            .client
            .head(&self.endpoint)
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");
        let response = self
            .send("count", request, BackendError::StoreUnavailable)
            .await?;

        parse_content_range(response.headers().get("content-range"))
    }

    async fn delete_all(&self) -> Result<(), BackendError> {
        let request = self
            .client
            .delete(&self.endpoint)
            .query(&[("id", "neq.0")])
            .header("Prefer", "return=minimal");
        self.send("delete", request, BackendError::StoreUnavailable)
            .await?;
        Ok(())
    }

    async fn bulk_insert(&self, records: &[StoredRecord]) -> Result<(), BackendError> {
        if records.is_empty() {
            return Ok(());
        }

        let rows = records
            .iter()
            .map(|record| InsertRow {
                content: &record.content,
                embedding: &record.embedding,
                metadata: &record.metadata,
            })
            .collect::<Vec<_>>();

        let request = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=minimal")
            .json(&rows);
        self.send("insert", request, BackendError::StoreWrite)
            .await?;
        Ok(())
    }
}

fn parse_content_range(header: Option<&HeaderValue>) -> Result<usize, BackendError> {
    let raw = header
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            BackendError::StoreUnavailable("count response had no content-range".to_string())
        })?;

    raw.rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<usize>().ok())
        .ok_or_else(|| {
            BackendError::StoreUnavailable(format!("unexpected content-range: {raw}"))
        })
}
