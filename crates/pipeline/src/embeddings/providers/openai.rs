//! OpenAI embedding provider.
//!
//! Uses the embeddings API with one input per call; the pipeline fans out
//! per-document calls concurrently and keeps its own index tagging, so a
//! single-input request is the unit here.

use crate::embeddings::EmbeddingProvider;
use grounder_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Embeddings API request payload.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Embeddings API response payload.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

/// OpenAI embedding client.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddings {
    /// Create a new client with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let payload = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to reach OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, text
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse OpenAI response: {}", e)))?;

        let row = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("OpenAI response had no embedding".to_string()))?;

        Ok(row.embedding)
    }
}
