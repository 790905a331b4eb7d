//! Search provider factory.

use crate::provider::SearchProvider;
use crate::providers::{BraveSearch, TavilySearch};
use grounder_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a search provider for the named backend.
///
/// API keys are resolved from the environment (`TAVILY_API_KEY`,
/// `BRAVE_API_KEY`).
pub fn create_provider(provider: &str) -> AppResult<Arc<dyn SearchProvider>> {
    match provider.to_lowercase().as_str() {
        "tavily" => Ok(Arc::new(TavilySearch::from_env()?)),
        "brave" => Ok(Arc::new(BraveSearch::from_env()?)),
        _ => Err(AppError::Config(format!(
            "Unknown search provider: {}",
            provider
        ))),
    }
}
