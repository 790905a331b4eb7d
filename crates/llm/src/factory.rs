//! Generation provider factory.
//!
//! Creates an [`LlmClient`] from the configured provider name, resolving
//! required secrets from environment variables.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use grounder_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a generation client for the named provider.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key; for OpenAI this falls back to the
///   `OPENAI_API_KEY` environment variable
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "openai" => {
            let key = match api_key {
                Some(key) => key.to_string(),
                None => std::env::var("OPENAI_API_KEY").map_err(|_| {
                    AppError::Config(
                        "OpenAI provider requires OPENAI_API_KEY to be set".to_string(),
                    )
                })?,
            };
            let client = match endpoint {
                Some(url) => OpenAiClient::with_base_url(key, url),
                None => OpenAiClient::new(key),
            };
            Ok(Arc::new(client))
        }
        "ollama" => {
            let client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url),
                None => OllamaClient::new(),
            };
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown generation provider: {}",
            provider
        ))),
    }
}
