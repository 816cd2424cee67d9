//! Environment-driven server configuration.

use kaiwa_core::{Error, Result};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default completion backend (Ollama's OpenAI-compatible endpoint).
pub const DEFAULT_COMPLETION_BASE_URL: &str = "http://localhost:11434";

/// Default completion model slug.
pub const DEFAULT_COMPLETION_MODEL: &str = "llama3.1";

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// None means in-memory stores (no persistence across restarts).
    pub database_url: Option<String>,
    pub completion_base_url: String,
    pub completion_api_key: Option<String>,
    pub completion_model: String,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("invalid PORT: {}", value)))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            database_url: std::env::var("DATABASE_URL").ok(),
            completion_base_url: std::env::var("COMPLETION_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_BASE_URL.to_string()),
            completion_api_key: std::env::var("COMPLETION_API_KEY").ok(),
            completion_model: std::env::var("COMPLETION_MODEL")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string()),
            search_api_key: std::env::var("SEARCH_API_KEY").ok(),
            search_engine_id: std::env::var("SEARCH_ENGINE_ID").ok(),
        })
    }

    /// True when both search credentials are present.
    pub fn search_configured(&self) -> bool {
        self.search_api_key.is_some() && self.search_engine_id.is_some()
    }
}
