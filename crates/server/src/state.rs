//! Shared application state.

use grounder_pipeline::{AnswerSynthesizer, EvidenceSelector, SessionStore};
use std::sync::Arc;

/// State shared by all request handlers.
///
/// The session store is owned here and injected into the synthesizer;
/// handlers and tests can also reach it directly.
pub struct AppState {
    /// Evidence selection pipeline
    pub selector: EvidenceSelector,

    /// Streaming answer synthesis
    pub synthesizer: AnswerSynthesizer,

    /// Per-user conversation history
    pub sessions: Arc<SessionStore>,

    /// Raw results requested per search
    pub num_results: u32,

    /// Evidence items kept after ranking
    pub top_k: usize,
}
