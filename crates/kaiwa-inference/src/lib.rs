//! # kaiwa-inference
//!
//! Completion-backend and web-search abstractions for kaiwa.
//!
//! The AI orchestrator in `kaiwa-server` talks to these traits only; concrete
//! backends (an OpenAI-compatible chat-completions API, the Google
//! Programmable Search JSON API) live here, together with deterministic mocks
//! for tests.

pub mod mock;
pub mod openai;
pub mod websearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use kaiwa_core::Result;

pub use mock::{MockCompletionBackend, MockSearchBackend};
pub use openai::OpenAiBackend;
pub use websearch::{GoogleSearchBackend, NullSearchBackend};

/// Role of a prompt message handed to a completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One message of the ordered sequence sent to the completion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// External AI completion backend.
///
/// Single attempt per call; the core never retries. A failed invocation
/// surfaces as `Error::CompletionFailed`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for the ordered message sequence
    /// (system + history + user).
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String>;
}

/// One web search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// External web-search collaborator.
///
/// A failure surfaces as `Error::RetrievalFailed`; context assembly never
/// silently falls back to plain mode.
#[async_trait]
pub trait WebSearchBackend: Send + Sync {
    /// Up to `limit` results for `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_message_roles_serialize_lowercase() {
        let json = serde_json::to_value(PromptMessage::assistant("ok")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "ok");
    }
}
