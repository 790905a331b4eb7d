//! Search provider trait.

use crate::types::RawResult;
use grounder_core::AppResult;

/// Trait for web search providers.
///
/// Implementations issue one network search per call and map the
/// provider's payload into ordered [`RawResult`]s. Returning fewer results
/// than `max_results` is normal; an empty list is a valid degraded outcome,
/// not an error.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Get the provider name (e.g., "tavily", "brave").
    fn provider_name(&self) -> &str;

    /// Search the web for `query`, requesting at most `max_results` hits.
    async fn search(&self, query: &str, max_results: u32) -> AppResult<Vec<RawResult>>;
}
