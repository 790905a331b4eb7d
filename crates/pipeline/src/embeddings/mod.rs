//! Embedding providers for evidence ranking.
//!
//! Every evidence document and every query is mapped to a fixed-dimension
//! dense vector through the [`EmbeddingProvider`] trait. All vectors from
//! one provider share a dimension; the similarity index enforces this when
//! it is built.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{OllamaEmbeddings, OpenAiEmbeddings, TrigramEmbeddings};
