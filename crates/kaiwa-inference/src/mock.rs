//! Mock backends for deterministic testing.
//!
//! [`MockCompletionBackend`] records every prompt it receives and answers
//! with a fixed response (or a configured failure). [`MockSearchBackend`]
//! serves canned results. Both are used heavily by the orchestrator and
//! context-pipeline tests in `kaiwa-server`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use kaiwa_core::{Error, Result};

use crate::{CompletionBackend, PromptMessage, SearchResult, WebSearchBackend};

/// Mock completion backend.
#[derive(Clone)]
pub struct MockCompletionBackend {
    response: String,
    fail: bool,
    calls: Arc<Mutex<Vec<Vec<PromptMessage>>>>,
}

impl Default for MockCompletionBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompletionBackend {
    pub fn new() -> Self {
        Self {
            response: "mock response".to_string(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fix the response text for all calls.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    /// Make every call fail with `CompletionFailed`.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Prompts received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<PromptMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletionBackend {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        if self.fail {
            return Err(Error::CompletionFailed("mock failure".to_string()));
        }
        Ok(self.response.clone())
    }
}

/// Mock web-search backend.
#[derive(Clone, Default)]
pub struct MockSearchBackend {
    results: Vec<SearchResult>,
    fail: bool,
}

impl MockSearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, results: Vec<SearchResult>) -> Self {
        self.results = results;
        self
    }

    /// Make every call fail with `RetrievalFailed`.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl WebSearchBackend for MockSearchBackend {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if self.fail {
            return Err(Error::RetrievalFailed("mock search failure".to_string()));
        }
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}
