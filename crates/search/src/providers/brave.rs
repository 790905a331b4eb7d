//! Brave search provider.
//!
//! GET https://api.search.brave.com/res/v1/web/search with a subscription
//! token. Results live under `web.results` with `title`, `description`,
//! and `url` fields.

use crate::provider::SearchProvider;
use crate::types::RawResult;
use grounder_core::{AppError, AppResult};
use serde_json::Value;
use std::time::Duration;

/// Search endpoint.
const SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Brave search client.
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
}

impl BraveSearch {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Retrieval(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    /// Create a new client with the key from `BRAVE_API_KEY`.
    pub fn from_env() -> AppResult<Self> {
        let api_key = std::env::var("BRAVE_API_KEY").map_err(|_| {
            AppError::Config("Brave provider requires BRAVE_API_KEY to be set".to_string())
        })?;
        Self::new(api_key)
    }
}

/// Map a Brave response payload to ordered raw results.
fn parse_results(payload: &Value) -> AppResult<Vec<RawResult>> {
    let rows = payload
        .get("web")
        .and_then(|v| v.get("results"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            AppError::Retrieval("Brave payload missing web.results array".to_string())
        })?;

    let mut results = Vec::new();
    for row in rows {
        let url = row
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();
        if url.is_empty() {
            continue;
        }

        results.push(RawResult {
            title: row
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("Untitled")
                .to_string(),
            body: row
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            url,
        });
    }

    Ok(results)
}

#[async_trait::async_trait]
impl SearchProvider for BraveSearch {
    fn provider_name(&self) -> &str {
        "brave"
    }

    async fn search(&self, query: &str, max_results: u32) -> AppResult<Vec<RawResult>> {
        tracing::debug!(max_results, "Searching Brave");

        let count = max_results.to_string();
        let response = self
            .client
            .get(SEARCH_URL)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to reach Brave: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Retrieval(format!(
                "Brave API error ({}): {}",
                status, text
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse Brave response: {}", e)))?;

        let results = parse_results(&payload)?;
        tracing::debug!(count = results.len(), "Brave search returned");

        Ok(results)
    }
}
