//! OpenAI-compatible chat-completions backend.
//!
//! Speaks the `/v1/chat/completions` wire format, which local gateways
//! (Ollama, llama.cpp server, LM Studio) also accept, so the base URL decides
//! where inference actually runs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kaiwa_core::{Error, Result};

use crate::{CompletionBackend, PromptMessage};

/// Default request timeout. The core imposes no timeout of its own; this is
/// the backend client's limit.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Completion backend for OpenAI-compatible chat APIs.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl OpenAiBackend {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        let start = Instant::now();
        debug!(
            subsystem = "inference",
            component = "openai",
            op = "complete",
            model = %self.model,
            message_count = messages.len(),
            "Starting completion request"
        );

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let mut builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(self.timeout)
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::CompletionFailed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::CompletionFailed(format!(
                "backend returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::CompletionFailed(format!("failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::CompletionFailed("empty choices in response".to_string()))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            subsystem = "inference",
            component = "openai",
            response_len = content.len(),
            duration_ms = elapsed,
            "Completion finished"
        );
        if elapsed > 30_000 {
            warn!(
                subsystem = "inference",
                component = "openai",
                duration_ms = elapsed,
                slow = true,
                "Slow completion request"
            );
        }

        Ok(content)
    }
}
