//! Evidence selection.
//!
//! Orchestrates the search provider, the embedding provider, and a
//! per-request [`FlatIndex`] to turn a question into a small ranked,
//! numbered evidence set plus a citation map. All-or-nothing with respect
//! to one retrieval cycle: any search or embedding failure aborts the
//! whole selection, except that zero search results degrade to an empty
//! evidence set.

use crate::embeddings::EmbeddingProvider;
use crate::index::FlatIndex;
use grounder_core::AppResult;
use grounder_search::SearchProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default number of raw results requested per search.
pub const DEFAULT_NUM_RESULTS: u32 = 8;

/// Default number of evidence items kept after ranking.
pub const DEFAULT_TOP_K: usize = 4;

/// One ranked piece of evidence.
///
/// `citation` is assigned by rank order (best match gets 1) and is stable
/// only within one retrieval+synthesis cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// 1-based citation number, in ranking order
    pub citation: u32,

    /// Source page title
    pub title: String,

    /// Source URL
    pub url: String,

    /// Formatted snippet line: `[<citation>] <title>: <body> (<url>)`
    pub snippet: String,
}

/// Source attribution for one citation number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitationSource {
    pub title: String,
    pub url: String,
}

/// Mapping from citation number to source attribution.
///
/// Keys are exactly the citation numbers of the matching evidence set.
/// Passed opaquely through synthesis and persisted with the turn.
pub type CitationMap = BTreeMap<u32, CitationSource>;

/// Selects and ranks evidence for a question.
#[derive(Clone)]
pub struct EvidenceSelector {
    search: Arc<dyn SearchProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EvidenceSelector {
    /// Create a selector over the given providers.
    pub fn new(search: Arc<dyn SearchProvider>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { search, embedder }
    }

    /// Select the `top_k` most relevant results for `question`.
    ///
    /// Searches for `num_results` raw results, embeds each result document
    /// and the question, ranks by squared Euclidean distance on a fresh
    /// flat index, and returns evidence items in citation order together
    /// with the matching citation map.
    ///
    /// Fewer than `top_k` available results clamp `top_k`; zero results
    /// return an empty evidence set and empty map without error.
    pub async fn select(
        &self,
        question: &str,
        num_results: u32,
        top_k: usize,
    ) -> AppResult<(Vec<EvidenceItem>, CitationMap)> {
        let results = self.search.search(question, num_results).await?;

        if results.is_empty() {
            tracing::info!("Search returned no results; proceeding with empty evidence");
            return Ok((Vec::new(), CitationMap::new()));
        }

        let top_k = top_k.min(results.len());

        // One embedding call per result document. The calls are independent
        // and issued concurrently; each future carries its result index so
        // the RawResult -> vector correspondence holds regardless of
        // completion order.
        let documents: Vec<String> = results
            .iter()
            .map(|r| format!("{}: {}", r.title, r.body))
            .collect();

        let embed_calls = documents.iter().enumerate().map(|(i, document)| {
            let embedder = Arc::clone(&self.embedder);
            async move { embedder.embed(document).await.map(|vector| (i, vector)) }
        });

        let mut tagged = futures::future::try_join_all(embed_calls).await?;
        tagged.sort_by_key(|(i, _)| *i);
        let vectors: Vec<Vec<f32>> = tagged.into_iter().map(|(_, v)| v).collect();

        let index = FlatIndex::build(vectors)?;

        // The question is embedded separately, never reused from the
        // document pass.
        let query_vector = self.embedder.embed(question).await?;
        let hits = index.query(&query_vector, top_k)?;

        let mut evidence = Vec::with_capacity(hits.len());
        let mut citations = CitationMap::new();

        for (rank, (result_idx, distance)) in hits.into_iter().enumerate() {
            let result = &results[result_idx];
            let citation = (rank + 1) as u32;

            tracing::debug!(citation, result_idx, distance, "Selected evidence");

            evidence.push(EvidenceItem {
                citation,
                title: result.title.clone(),
                url: result.url.clone(),
                snippet: format!(
                    "[{}] {}: {} ({})",
                    citation, result.title, result.body, result.url
                ),
            });
            citations.insert(
                citation,
                CitationSource {
                    title: result.title.clone(),
                    url: result.url.clone(),
                },
            );
        }

        tracing::info!(
            selected = evidence.len(),
            "Evidence selection completed"
        );

        Ok((evidence, citations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grounder_core::AppError;
    use grounder_search::RawResult;
    use std::collections::HashMap;

    /// Search provider returning a fixed result list.
    struct StubSearch {
        results: Vec<RawResult>,
    }

    #[async_trait::async_trait]
    impl SearchProvider for StubSearch {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn search(&self, _query: &str, max_results: u32) -> AppResult<Vec<RawResult>> {
            Ok(self
                .results
                .iter()
                .take(max_results as usize)
                .cloned()
                .collect())
        }
    }

    /// Search provider that always fails.
    struct FailingSearch;

    #[async_trait::async_trait]
    impl SearchProvider for FailingSearch {
        fn provider_name(&self) -> &str {
            "failing"
        }

        async fn search(&self, _query: &str, _max_results: u32) -> AppResult<Vec<RawResult>> {
            Err(AppError::Retrieval("engine unreachable".to_string()))
        }
    }

    /// Embedding provider with a fixed text -> vector table.
    struct StubEmbeddings {
        vectors: HashMap<String, Vec<f32>>,
        fallback: Vec<f32>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for StubEmbeddings {
        fn provider_name(&self) -> &str {
            "stub"
        }

        fn model_name(&self) -> &str {
            "stub-v1"
        }

        async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()))
        }
    }

    fn result(n: usize) -> RawResult {
        RawResult::new(
            format!("Title {}", n),
            format!("Body {}", n),
            format!("https://example.com/{}", n),
        )
    }

    /// Four results whose document embeddings rank 2, 0, 3, 1 for the
    /// query at the origin.
    fn selector_fixture() -> EvidenceSelector {
        let results: Vec<RawResult> = (0..4).map(result).collect();

        let mut vectors = HashMap::new();
        vectors.insert("Title 0: Body 0".to_string(), vec![2.0, 0.0]);
        vectors.insert("Title 1: Body 1".to_string(), vec![4.0, 0.0]);
        vectors.insert("Title 2: Body 2".to_string(), vec![1.0, 0.0]);
        vectors.insert("Title 3: Body 3".to_string(), vec![3.0, 0.0]);
        vectors.insert("what is nearby?".to_string(), vec![0.0, 0.0]);

        EvidenceSelector::new(
            Arc::new(StubSearch { results }),
            Arc::new(StubEmbeddings {
                vectors,
                fallback: vec![9.0, 9.0],
            }),
        )
    }

    #[tokio::test]
    async fn test_citations_are_contiguous_and_match_map() {
        let selector = selector_fixture();
        let (evidence, citations) = selector.select("what is nearby?", 8, 4).await.unwrap();

        assert_eq!(evidence.len(), 4);
        let numbers: Vec<u32> = evidence.iter().map(|e| e.citation).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);

        let keys: Vec<u32> = citations.keys().copied().collect();
        assert_eq!(keys, numbers);
    }

    #[tokio::test]
    async fn test_ranking_order_maps_back_to_raw_results() {
        let selector = selector_fixture();
        let (evidence, citations) = selector.select("what is nearby?", 8, 4).await.unwrap();

        // Distances order the raw results as 2, 0, 3, 1
        let titles: Vec<&str> = evidence.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Title 2", "Title 0", "Title 3", "Title 1"]);

        assert_eq!(citations[&1].title, "Title 2");
        assert_eq!(citations[&1].url, "https://example.com/2");
    }

    #[tokio::test]
    async fn test_snippet_format() {
        let selector = selector_fixture();
        let (evidence, _) = selector.select("what is nearby?", 8, 4).await.unwrap();

        assert_eq!(
            evidence[0].snippet,
            "[1] Title 2: Body 2 (https://example.com/2)"
        );
    }

    #[tokio::test]
    async fn test_top_k_clamped_to_available_results() {
        let selector = selector_fixture();
        let (evidence, citations) = selector.select("what is nearby?", 2, 4).await.unwrap();

        assert_eq!(evidence.len(), 2);
        assert_eq!(citations.len(), 2);
    }

    #[tokio::test]
    async fn test_zero_results_degrade_to_empty() {
        let selector = EvidenceSelector::new(
            Arc::new(StubSearch {
                results: Vec::new(),
            }),
            Arc::new(StubEmbeddings {
                vectors: HashMap::new(),
                fallback: vec![1.0],
            }),
        );

        let (evidence, citations) = selector.select("anything", 8, 4).await.unwrap();
        assert!(evidence.is_empty());
        assert!(citations.is_empty());
    }

    #[tokio::test]
    async fn test_selection_is_idempotent() {
        let selector = selector_fixture();
        let (first, _) = selector.select("what is nearby?", 8, 4).await.unwrap();
        let (second, _) = selector.select("what is nearby?", 8, 4).await.unwrap();

        let first_titles: Vec<&str> = first.iter().map(|e| e.title.as_str()).collect();
        let second_titles: Vec<&str> = second.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(first_titles, second_titles);
    }

    #[tokio::test]
    async fn test_search_failure_aborts_selection() {
        let selector = EvidenceSelector::new(
            Arc::new(FailingSearch),
            Arc::new(StubEmbeddings {
                vectors: HashMap::new(),
                fallback: vec![1.0],
            }),
        );

        match selector.select("anything", 8, 4).await {
            Err(AppError::Retrieval(_)) => {}
            other => panic!("Expected retrieval error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_mismatched_dimensions_abort_selection() {
        let results: Vec<RawResult> = (0..2).map(result).collect();

        let mut vectors = HashMap::new();
        vectors.insert("Title 0: Body 0".to_string(), vec![1.0, 0.0]);
        vectors.insert("Title 1: Body 1".to_string(), vec![1.0, 0.0, 0.0]);

        let selector = EvidenceSelector::new(
            Arc::new(StubSearch { results }),
            Arc::new(StubEmbeddings {
                vectors,
                fallback: vec![0.0, 0.0],
            }),
        );

        match selector.select("anything", 8, 2).await {
            Err(AppError::Embedding(_)) => {}
            other => panic!("Expected embedding error, got {:?}", other.map(|_| ())),
        }
    }
}
