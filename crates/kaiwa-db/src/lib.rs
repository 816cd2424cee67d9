//! # kaiwa-db
//!
//! PostgreSQL persistence layer for kaiwa.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for messages, conversation memory,
//!   documents, and session resolution
//! - In-memory repository implementations for tests and database-less
//!   operation
//!
//! ## Example
//!
//! ```rust,ignore
//! use kaiwa_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/kaiwa").await?;
//!     let history = db
//!         .messages
//!         .find_recent(kaiwa_core::Channel::General, 50, false)
//!         .await?;
//!     println!("{} messages", history.len());
//!     Ok(())
//! }
//! ```

pub mod conversations;
pub mod documents;
pub mod mem;
pub mod messages;
pub mod pool;
pub mod sessions;

use std::sync::Arc;

use sqlx::postgres::PgPool;

// Re-export core types
pub use kaiwa_core::*;

pub use conversations::PgConversationRepository;
pub use documents::PgDocumentRepository;
pub use messages::PgMessageRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use sessions::PgSessionResolver;

/// Aggregated handle over all Postgres-backed repositories.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    pub messages: Arc<PgMessageRepository>,
    pub conversations: Arc<PgConversationRepository>,
    pub documents: Arc<PgDocumentRepository>,
    pub sessions: Arc<PgSessionResolver>,
}

impl Database {
    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            conversations: Arc::new(PgConversationRepository::new(pool.clone())),
            documents: Arc::new(PgDocumentRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionResolver::new(pool.clone())),
            pool,
        }
    }

    /// Run embedded schema migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Ok(())
    }
}
