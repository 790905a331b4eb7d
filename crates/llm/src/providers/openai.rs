//! OpenAI chat-completions provider.
//!
//! Streaming uses server-sent events: the response body is a sequence of
//! `data: <json>` lines terminated by `data: [DONE]`. Network chunks can
//! split an event anywhere, so decoding keeps a line buffer across chunks.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use futures::StreamExt;
use grounder_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Chat-completions request payload.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Non-streaming response payload.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// One streamed SSE event payload.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI generation client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client with the default API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_chat_request(&self, request: &LlmRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            stream: request.stream,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    async fn send(&self, payload: &ChatRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to reach OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

/// Decode every complete SSE line currently in the buffer.
///
/// Leaves any trailing partial line in place for the next network chunk.
fn drain_sse_lines(buffer: &mut String) -> Vec<AppResult<LlmStreamChunk>> {
    let mut items = Vec::new();

    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        if let Some(item) = parse_sse_line(line.trim()) {
            items.push(item);
        }
    }

    items
}

/// Parse a single SSE line into a stream chunk.
///
/// Blank lines and non-data fields are skipped; `[DONE]` becomes the
/// terminal chunk.
fn parse_sse_line(line: &str) -> Option<AppResult<LlmStreamChunk>> {
    let payload = line.strip_prefix("data:")?.trim();

    if payload.is_empty() {
        return None;
    }

    if payload == "[DONE]" {
        return Some(Ok(LlmStreamChunk {
            content: String::new(),
            done: true,
        }));
    }

    match serde_json::from_str::<ChatChunk>(payload) {
        Ok(chunk) => {
            let choice = chunk.choices.into_iter().next()?;
            Some(Ok(LlmStreamChunk {
                content: choice.delta.content.unwrap_or_default(),
                done: choice.finish_reason.is_some(),
            }))
        }
        Err(e) => Some(Err(AppError::Generation(format!(
            "Failed to parse stream event: {}",
            e
        )))),
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, "Sending completion request to OpenAI");

        let mut payload = self.to_chat_request(request);
        payload.stream = false;

        let response = self.send(&payload).await?;

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse OpenAI response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Generation("OpenAI response had no choices".to_string()))?;

        let usage = chat
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: chat.model,
            usage,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!(model = %request.model, "Starting streaming request to OpenAI");

        let mut payload = self.to_chat_request(request);
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
                        drain_sse_lines(buffer)
                    }
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(futures::stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }
}
