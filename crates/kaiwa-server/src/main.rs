//! kaiwa-server entry point.
//!
//! Wires the persistence layer, the completion/search backends, and the
//! realtime hub into an axum application.

mod assistant;
mod config;
mod context;
mod guard;
mod http;
mod hub;
mod presence;
mod session;
mod state;
mod ws;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kaiwa_core::{
    ConversationRepository, DocumentRepository, MessageRepository, SessionResolver,
};
use kaiwa_db::mem::{
    MemConversationRepository, MemDocumentRepository, MemMessageRepository, MemSessionResolver,
};
use kaiwa_db::Database;
use kaiwa_inference::{
    CompletionBackend, GoogleSearchBackend, NullSearchBackend, OpenAiBackend, WebSearchBackend,
};

use crate::assistant::Assistant;
use crate::config::ServerConfig;
use crate::context::ContextBuilder;
use crate::guard::ChannelGuard;
use crate::hub::ConnectionRegistry;
use crate::presence::PresenceTracker;
use crate::state::AppState;

/// Repository handles behind trait objects so Postgres and in-memory
/// implementations are interchangeable.
struct Stores {
    messages: Arc<dyn MessageRepository>,
    conversations: Arc<dyn ConversationRepository>,
    documents: Arc<dyn DocumentRepository>,
    sessions: Arc<dyn SessionResolver>,
}

impl Stores {
    async fn postgres(url: &str) -> anyhow::Result<Self> {
        let db = Database::connect(url).await?;
        db.migrate().await?;
        Ok(Self {
            messages: db.messages.clone(),
            conversations: db.conversations.clone(),
            documents: db.documents.clone(),
            sessions: db.sessions.clone(),
        })
    }

    fn in_memory() -> Self {
        Self {
            messages: Arc::new(MemMessageRepository::new()),
            conversations: Arc::new(MemConversationRepository::new()),
            documents: Arc::new(MemDocumentRepository::new()),
            sessions: Arc::new(MemSessionResolver::new()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let stores = match &config.database_url {
        Some(url) => Stores::postgres(url).await?,
        None => {
            warn!(
                subsystem = "server",
                "DATABASE_URL not set, using in-memory stores"
            );
            Stores::in_memory()
        }
    };

    let completion: Arc<dyn CompletionBackend> = Arc::new(OpenAiBackend::new(
        &config.completion_base_url,
        config.completion_api_key.clone(),
        &config.completion_model,
    ));
    let search: Arc<dyn WebSearchBackend> = if config.search_configured() {
        Arc::new(GoogleSearchBackend::new(
            config.search_api_key.clone().unwrap_or_default(),
            config.search_engine_id.clone().unwrap_or_default(),
        ))
    } else {
        warn!(
            subsystem = "server",
            "Search credentials not set, web mode will fail with RetrievalFailed"
        );
        Arc::new(NullSearchBackend)
    };

    let assistant = Assistant::new(
        completion,
        ContextBuilder::new(stores.documents, search),
        stores.conversations.clone(),
        stores.messages.clone(),
    );

    let state = AppState {
        messages: stores.messages,
        conversations: stores.conversations,
        sessions: stores.sessions,
        guard: ChannelGuard::new(),
        registry: Arc::new(ConnectionRegistry::new()),
        presence: Arc::new(PresenceTracker::new()),
        assistant: Arc::new(assistant),
    };

    let app = http::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        subsystem = "server",
        addr = %addr,
        model = %config.completion_model,
        "kaiwa-server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
