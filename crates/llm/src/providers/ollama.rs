//! Ollama generation provider.
//!
//! Talks to a local Ollama runtime. Streaming responses are
//! newline-delimited JSON objects from `/api/generate`; a line buffer is
//! kept across network chunks since a JSON object can be split anywhere.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use futures::StreamExt;
use grounder_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default Ollama endpoint.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    stream: bool,
}

/// Ollama API response format, one object per streamed line.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama generation client.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new client against the default local endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            temperature: request.temperature,
            num_predict: request.max_tokens,
            stream: request.stream,
        }
    }

    async fn send(&self, payload: &OllamaRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to reach Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode every complete NDJSON line currently in the buffer.
fn drain_ndjson_lines(buffer: &mut String) -> Vec<AppResult<LlmStreamChunk>> {
    let mut items = Vec::new();

    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let item = serde_json::from_str::<OllamaResponse>(line)
            .map(|r| LlmStreamChunk {
                content: r.response,
                done: r.done,
            })
            .map_err(|e| AppError::Generation(format!("Failed to parse stream chunk: {}", e)));
        items.push(item);
    }

    items
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to Ollama");

        let mut payload = self.to_ollama_request(request);
        payload.stream = false;

        let response = self.send(&payload).await?;

        // Non-streaming responses are a single JSON object
        let ollama: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(LlmResponse {
            content: ollama.response,
            model: request.model.clone(),
            usage: LlmUsage::new(
                ollama.prompt_eval_count.unwrap_or(0),
                ollama.eval_count.unwrap_or(0),
            ),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!(model = %request.model, "Starting streaming request to Ollama");

        let mut payload = self.to_ollama_request(request);
        payload.stream = true;

        let response = self.send(&payload).await?;

        let stream = response
            .bytes_stream()
            .map(|result| {
                result.map_err(|e| AppError::Generation(format!("Stream error: {}", e)))
            })
            .scan(String::new(), |buffer, result| {
                let items = match result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_ndjson_lines(buffer)
                    }
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(futures::stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_request_conversion() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_temperature(0.2)
            .with_max_tokens(100);

        let ollama = client.to_ollama_request(&request);
        assert_eq!(ollama.model, "llama3.2");
        assert_eq!(ollama.prompt, "Hello");
        assert_eq!(ollama.temperature, Some(0.2));
        assert_eq!(ollama.num_predict, Some(100));
    }

    #[test]
    fn test_drain_ndjson_lines() {
        let mut buffer = String::from(
            "{\"response\":\"Hel\",\"done\":false}\n{\"response\":\"lo\",\"done\":false}\n{\"resp",
        );
        let items = drain_ndjson_lines(&mut buffer);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().content, "Hel");
        assert_eq!(items[1].as_ref().unwrap().content, "lo");
        assert!(buffer.starts_with("{\"resp"));
    }

    #[test]
    fn test_drain_final_chunk() {
        let mut buffer =
            String::from("{\"response\":\"\",\"done\":true,\"eval_count\":42}\n");
        let items = drain_ndjson_lines(&mut buffer);

        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap().done);
    }
}
