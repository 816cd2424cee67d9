//! Web-search backend (Google Programmable Search JSON API).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use kaiwa_core::{Error, Result};

use crate::{SearchResult, WebSearchBackend};

const API_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Default request timeout for search calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Google Programmable Search client.
pub struct GoogleSearchBackend {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    timeout: Duration,
}

impl GoogleSearchBackend {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Stand-in used when no search credentials are configured.
///
/// Every call surfaces `RetrievalFailed`, so web-mode queries fail loudly
/// instead of silently degrading to plain mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSearchBackend;

#[async_trait]
impl WebSearchBackend for NullSearchBackend {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
        Err(Error::RetrievalFailed(
            "web search backend not configured".to_string(),
        ))
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

#[async_trait]
impl WebSearchBackend for GoogleSearchBackend {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .get(API_URL)
            .timeout(self.timeout)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", &limit.min(10).to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::RetrievalFailed(format!("search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RetrievalFailed(format!(
                "search backend returned {}: {}",
                status, body
            )));
        }

        let result: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::RetrievalFailed(format!("failed to parse search response: {}", e)))?;

        debug!(
            subsystem = "inference",
            component = "websearch",
            op = "search",
            result_count = result.items.len(),
            "Search complete"
        );

        Ok(result
            .items
            .into_iter()
            .take(limit)
            .map(|item| SearchResult {
                title: item.title,
                snippet: item.snippet,
                link: item.link,
            })
            .collect())
    }
}
