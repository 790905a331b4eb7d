//! Retrieval-augmented answering pipeline.
//!
//! This crate is the core of the grounder service. It turns raw web search
//! results into a small ranked evidence set (embedding similarity over a
//! per-request flat index), assembles a grounding prompt from evidence,
//! conversation history, and the question, streams the synthesized answer
//! while tracking citation provenance, and keeps per-user session state
//! across turns.
//!
//! The flow per question:
//! [`EvidenceSelector`] → [`AnswerSynthesizer`] (reading and committing to
//! the [`SessionStore`]) → caller. A second read-only path serves the
//! evidence set alone, without invoking the generator.

pub mod embeddings;
pub mod evidence;
pub mod index;
pub mod prompt;
pub mod session;
pub mod synthesize;

// Re-export commonly used types
pub use embeddings::{create_provider as create_embedding_provider, EmbeddingProvider};
pub use evidence::{CitationMap, CitationSource, EvidenceItem, EvidenceSelector};
pub use index::FlatIndex;
pub use session::{SessionStore, Turn};
pub use synthesize::{AnswerChunk, AnswerStream, AnswerSynthesizer};
