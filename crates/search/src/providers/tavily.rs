//! Tavily search provider.
//!
//! POST https://api.tavily.com/search with a bearer key. Results carry
//! `title`, `content`, and `url` fields; entries without a URL are
//! dropped.

use crate::provider::SearchProvider;
use crate::types::RawResult;
use grounder_core::{AppError, AppResult};
use serde_json::Value;
use std::time::Duration;

/// Search endpoint.
const SEARCH_URL: &str = "https://api.tavily.com/search";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tavily search client.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
}

impl TavilySearch {
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

    /// Create a new client with the key from `TAVILY_API_KEY`.
    pub fn from_env() -> AppResult<Self> {
        let api_key = std::env::var("TAVILY_API_KEY").map_err(|_| {
            AppError::Config("Tavily provider requires TAVILY_API_KEY to be set".to_string())
        })?;
        Self::new(api_key)
    }
}

/// Map a Tavily response payload to ordered raw results.
fn parse_results(payload: &Value) -> AppResult<Vec<RawResult>> {
    let rows = payload
        .get("results")
        .and_then(|v| v.as_array())
        .ok_or_else(|| AppError::Retrieval("Tavily payload missing results array".to_string()))?;

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
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            url,
        });
    }

    Ok(results)
}

#[async_trait::async_trait]
impl SearchProvider for TavilySearch {
    fn provider_name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: u32) -> AppResult<Vec<RawResult>> {
        tracing::debug!(max_results, "Searching Tavily");

        let body = serde_json::json!({
            "query": query,
            "search_depth": "basic",
            "max_results": max_results,
            "include_answer": false,
            "include_raw_content": false
        });

        let response = self
            .client
            .post(SEARCH_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to reach Tavily: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Retrieval(format!(
                "Tavily API error ({}): {}",
                status, text
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse Tavily response: {}", e)))?;

        let results = parse_results(&payload)?;
        tracing::debug!(count = results.len(), "Tavily search returned");

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let payload = serde_json::json!({
            "results": [
                {"title": "Paris", "content": "Capital of France", "url": "https://a.example"},
                {"title": "France", "content": "A country", "url": "https://b.example"}
            ]
        });

        let results = parse_results(&payload).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Paris");
        assert_eq!(results[0].body, "Capital of France");
        assert_eq!(results[1].url, "https://b.example");
    }

    #[test]
    fn test_parse_skips_missing_url() {
        let payload = serde_json::json!({
            "results": [
                {"title": "No url", "content": "dropped"},
                {"title": "Kept", "content": "ok", "url": "https://c.example"}
            ]
        });

        let results = parse_results(&payload).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Kept");
    }

    #[test]
    fn test_parse_missing_results_array() {
        let payload = serde_json::json!({"detail": "quota exceeded"});
        assert!(parse_results(&payload).is_err());
    }

    #[test]
    fn test_parse_empty_results() {
        let payload = serde_json::json!({"results": []});
        assert!(parse_results(&payload).unwrap().is_empty());
    }
}
