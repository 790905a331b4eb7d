//! Streaming answer synthesis.
//!
//! Builds the grounding prompt, drives the generation provider in
//! streaming mode, forwards fragments to the caller in arrival order, and
//! commits the finished turn to the session store.
//!
//! Commit rules:
//! - Clean completion commits the concatenated answer, exactly once, after
//!   the stream is fully drained.
//! - A failure (pre-stream or mid-stream) leaves already-yielded fragments
//!   standing, yields one terminal [`AnswerChunk::Failure`], and commits a
//!   turn with the error text as the answer and no sources.
//! - Dropping the stream before it finishes (caller disconnect) drops the
//!   in-flight generation call and commits nothing.
//!
//! A failed call is never retried; the caller must resubmit.

use crate::evidence::{CitationMap, EvidenceItem};
use crate::prompt;
use crate::session::{SessionStore, Turn};
use futures::{Stream, StreamExt};
use grounder_core::AppResult;
use grounder_llm::{LlmClient, LlmRequest, LlmStream};
use std::pin::Pin;
use std::sync::Arc;

/// One item of a synthesized answer stream.
///
/// Failures stay structurally distinct from text so callers can
/// discriminate; the transport layer decides how to render them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerChunk {
    /// Incremental answer text, forwarded as received
    Text(String),

    /// Terminal failure marker; no further items follow
    Failure(String),
}

/// Finite, single-consumer, non-restartable stream of answer chunks.
pub type AnswerStream = Pin<Box<dyn Stream<Item = AnswerChunk> + Send>>;

/// Synthesizes grounded answers and maintains session history.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    sessions: Arc<SessionStore>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnswerSynthesizer {
    /// Create a synthesizer over the given generation client and store.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        sessions: Arc<SessionStore>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            llm,
            sessions,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    /// Synthesize an answer for `question` grounded in `evidence`.
    ///
    /// Reads the user's history up front; the generation call itself is
    /// issued lazily on the first poll of the returned stream, so even a
    /// connection failure is reported in-stream rather than here. Errors
    /// returned directly are prompt-assembly failures only.
    pub fn synthesize(
        &self,
        user_id: &str,
        question: &str,
        evidence: &[EvidenceItem],
        sources: CitationMap,
    ) -> AppResult<AnswerStream> {
        let history = self.sessions.history(user_id);

        tracing::debug!(
            user_id,
            prior_turns = history.len(),
            evidence = evidence.len(),
            "Synthesizing answer"
        );

        let grounding = prompt::build_grounding_prompt(
            &prompt::render_evidence(evidence),
            &prompt::render_history(&history),
            question,
        )?;

        let request = LlmRequest::new(grounding, &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_streaming();

        let synthesis = Synthesis {
            llm: Arc::clone(&self.llm),
            sessions: Arc::clone(&self.sessions),
            user_id: user_id.to_string(),
            question: question.to_string(),
            sources,
            request,
            answer: String::new(),
            phase: Phase::Connect,
        };

        Ok(Box::pin(futures::stream::unfold(synthesis, advance)))
    }
}

/// Where the synthesis state machine currently is.
enum Phase {
    /// Generation call not yet issued
    Connect,

    /// Forwarding fragments from the provider stream
    Streaming(LlmStream),

    /// Turn committed (or failed); nothing left to yield
    Finished,
}

/// Owned state threaded through the unfold steps.
///
/// Dropping this mid-stream drops the inner provider stream, cancelling
/// the in-flight call without committing a turn.
struct Synthesis {
    llm: Arc<dyn LlmClient>,
    sessions: Arc<SessionStore>,
    user_id: String,
    question: String,
    sources: CitationMap,
    request: LlmRequest,
    answer: String,
    phase: Phase,
}

impl Synthesis {
    fn commit_success(&mut self) {
        let sources = std::mem::take(&mut self.sources);
        self.sessions.append(
            &self.user_id,
            Turn::new(self.question.clone(), self.answer.clone(), sources),
        );
        tracing::info!(user_id = %self.user_id, "Committed answer turn");
    }

    fn commit_failure(&mut self, message: &str) {
        self.sessions.append(
            &self.user_id,
            Turn::new(
                self.question.clone(),
                format!("Error: {}", message),
                CitationMap::new(),
            ),
        );
        tracing::warn!(user_id = %self.user_id, error = message, "Committed error turn");
    }
}

/// One step of the synthesis stream.
async fn advance(mut synthesis: Synthesis) -> Option<(AnswerChunk, Synthesis)> {
    loop {
        match std::mem::replace(&mut synthesis.phase, Phase::Finished) {
            Phase::Connect => match synthesis.llm.stream(&synthesis.request).await {
                Ok(inner) => {
                    synthesis.phase = Phase::Streaming(inner);
                }
                Err(e) => {
                    let message = e.to_string();
                    synthesis.commit_failure(&message);
                    return Some((AnswerChunk::Failure(message), synthesis));
                }
            },

            Phase::Streaming(mut inner) => match inner.next().await {
                Some(Ok(chunk)) => {
                    if !chunk.content.is_empty() {
                        synthesis.answer.push_str(&chunk.content);
                    }

                    if chunk.done {
                        synthesis.commit_success();
                        if chunk.content.is_empty() {
                            return None;
                        }
                        return Some((AnswerChunk::Text(chunk.content), synthesis));
                    }

                    if chunk.content.is_empty() {
                        // Keep polling; nothing to forward yet
                        synthesis.phase = Phase::Streaming(inner);
                        continue;
                    }

                    synthesis.phase = Phase::Streaming(inner);
                    return Some((AnswerChunk::Text(chunk.content), synthesis));
                }

                Some(Err(e)) => {
                    let message = e.to_string();
                    synthesis.commit_failure(&message);
                    return Some((AnswerChunk::Failure(message), synthesis));
                }

                None => {
                    synthesis.commit_success();
                    return None;
                }
            },

            Phase::Finished => return None,
        }
    }
}
