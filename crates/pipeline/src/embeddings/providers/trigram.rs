//! Deterministic local embedding provider.
//!
//! Hashes word and character-trigram features into a fixed-dimension
//! vector and normalizes to unit length. The vectors are content-aware
//! enough to rank obviously-related text above unrelated text, which makes
//! this provider useful for tests and for running the service without any
//! embedding API.

use crate::embeddings::EmbeddingProvider;
use grounder_core::AppResult;
use std::collections::{HashMap, HashSet};

/// Default embedding dimension.
const DEFAULT_DIMENSIONS: usize = 384;

/// Words ignored when building features.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Trigram-hashing embedding provider.
pub struct TrigramEmbeddings {
    dimensions: usize,
}

impl TrigramEmbeddings {
    /// Create a provider with a custom dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.len() > 2)
            .collect();

        let mut word_freq = HashMap::new();
        for word in &words {
            *word_freq.entry(*word).or_insert(0u32) += 1;
        }

        for (word, freq) in &word_freq {
            // Character trigrams spread each word over several dimensions
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!("{}{}{}", chars[i], chars[i + 1], chars[i + 2]);
                let hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));
                embedding[(hash as usize) % self.dimensions] += (*freq as f32).sqrt();
            }

            // Whole-word feature
            let hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(hash as usize) % self.dimensions] += *freq as f32;
        }

        // Normalize to unit length
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

impl Default for TrigramEmbeddings {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramEmbeddings {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}
