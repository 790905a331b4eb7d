//! Generation provider integration for the grounder service.
//!
//! This crate provides a provider-agnostic abstraction for the model that
//! synthesizes answers. Providers are consumed through the [`LlmClient`]
//! trait, which supports both one-shot completion and incremental
//! streaming; the answering pipeline only ever uses the streaming path.
//!
//! # Providers
//! - **OpenAI**: chat completions with SSE streaming (default)
//! - **Ollama**: local runtime with newline-delimited JSON streaming

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
