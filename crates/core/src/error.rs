//! Error types for the grounder service.
//!
//! This module defines a unified error enum covering every failure category
//! in the answering pipeline: configuration, I/O, web search, embedding,
//! generation, and serialization errors.

use thiserror::Error;

/// Unified error type for the grounder service.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Errors are propagated, never panicked on.
///
/// Search and embedding failures abort a request before any answer bytes
/// are streamed; generation failures after the stream has started are
/// surfaced in-band by the synthesizer instead of through this type.
/// An unknown session key is not an error anywhere in the service — it
/// means an empty history.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Web search provider errors
    #[error("Search error: {0}")]
    Retrieval(String),

    /// Embedding provider errors, including dimension mismatches
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Generation provider errors, pre-stream or mid-stream
    #[error("Generation error: {0}")]
    Generation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
