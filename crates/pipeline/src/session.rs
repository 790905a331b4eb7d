//! Per-user conversation state.
//!
//! The session store is the only shared mutable state in the service. It
//! lives for the lifetime of the process, is never persisted, and never
//! evicts: each user's history grows by one turn per completed answer.
//! The keyed map shards its locks, so requests for different users do not
//! contend; appends for the same user are atomic, though concurrent
//! requests for one user may still interleave in either order.

use crate::evidence::CitationMap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// One completed question/answer exchange.
///
/// Immutable once appended. A failed generation is also recorded as a
/// turn, with the error text as the answer and no sources, so follow-up
/// questions keep their conversational footing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The user's question
    pub question: String,

    /// The full synthesized answer (or error text)
    pub answer: String,

    /// Citation attributions for the answer
    pub sources: CitationMap,

    /// When the turn was committed
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(question: impl Into<String>, answer: impl Into<String>, sources: CitationMap) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            sources,
            created_at: Utc::now(),
        }
    }
}

/// Process-wide store of per-user conversation history.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Vec<Turn>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a user's history in append order.
    ///
    /// An unknown user id yields an empty history; it is not an error and
    /// does not create a session.
    pub fn history(&self, user_id: &str) -> Vec<Turn> {
        self.sessions
            .get(user_id)
            .map(|turns| turns.clone())
            .unwrap_or_default()
    }

    /// Append a completed turn to a user's session.
    ///
    /// Creates the session on first use. The append holds the entry lock
    /// for the key, so concurrent appends for the same user cannot lose
    /// updates.
    pub fn append(&self, user_id: &str, turn: Turn) {
        self.sessions
            .entry(user_id.to_string())
            .or_default()
            .push(turn);
    }

    /// Number of turns recorded for a user.
    pub fn turn_count(&self, user_id: &str) -> usize {
        self.sessions
            .get(user_id)
            .map(|turns| turns.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_user_has_empty_history() {
        let store = SessionStore::new();
        assert!(store.history("nobody").is_empty());
        assert_eq!(store.turn_count("nobody"), 0);
    }

    #[test]
    fn test_append_preserves_order() {
        let store = SessionStore::new();
        store.append("alice", Turn::new("q1", "a1", CitationMap::new()));
        store.append("alice", Turn::new("q2", "a2", CitationMap::new()));

        let history = store.history("alice");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "q1");
        assert_eq!(history[1].question, "q2");
    }

    #[test]
    fn test_users_are_isolated() {
        let store = SessionStore::new();
        store.append("alice", Turn::new("q", "a", CitationMap::new()));

        assert_eq!(store.turn_count("alice"), 1);
        assert_eq!(store.turn_count("bob"), 0);
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let store = Arc::new(SessionStore::new());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.append(
                    "shared",
                    Turn::new(format!("q{}", i), "a", CitationMap::new()),
                );
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.turn_count("shared"), 32);
    }
}
