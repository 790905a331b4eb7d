//! Embedding provider trait and factory.

use grounder_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get provider name (e.g., "openai", "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    ///
    /// The output order matches the input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Create an embedding provider for the named backend.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama", "trigram")
/// * `model` - Model identifier passed through to the provider
/// * `api_key` - Optional API key; for OpenAI this falls back to the
///   `OPENAI_API_KEY` environment variable
pub fn create_provider(
    provider: &str,
    model: &str,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider.to_lowercase().as_str() {
        "openai" => {
            let key = match api_key {
                Some(key) => key.to_string(),
                None => std::env::var("OPENAI_API_KEY").map_err(|_| {
                    AppError::Config(
                        "OpenAI embedding provider requires OPENAI_API_KEY to be set".to_string(),
                    )
                })?,
            };
            Ok(Arc::new(super::providers::OpenAiEmbeddings::new(key, model)?))
        }

        "ollama" => Ok(Arc::new(super::providers::OllamaEmbeddings::new(model)?)),

        "trigram" => Ok(Arc::new(super::providers::TrigramEmbeddings::default())),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, ollama, trigram",
            provider
        ))),
    }
}
