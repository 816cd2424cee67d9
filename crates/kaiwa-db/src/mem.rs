//! In-memory repository implementations.
//!
//! Back the same traits as the Postgres repositories, for unit tests and
//! for running the server without a database. State lives behind
//! `tokio::sync::RwLock`; semantics (ordering, deletion visibility,
//! ownership checks) match the SQL implementations exactly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use kaiwa_core::{
    Channel, ChatMessage, ConversationRepository, Document, DocumentRepository, Error, Identity,
    MemoryTurn, MessageRepository, NewChatMessage, Result, SessionResolver, TurnRole,
};

/// In-memory [`MessageRepository`].
#[derive(Default, Clone)]
pub struct MemMessageRepository {
    rows: Arc<RwLock<Vec<ChatMessage>>>,
}

impl MemMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemMessageRepository {
    async fn append(&self, msg: NewChatMessage) -> Result<ChatMessage> {
        let record = ChatMessage {
            id: Uuid::new_v4(),
            author_id: msg.author_id,
            author_display_name: msg.author_display_name,
            author_avatar_url: msg.author_avatar_url,
            text: msg.text,
            channel: msg.channel,
            deleted: false,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_recent(
        &self,
        channel: Channel,
        limit: i64,
        include_deleted: bool,
    ) -> Result<Vec<ChatMessage>> {
        let rows = self.rows.read().await;
        let mut matching: Vec<ChatMessage> = rows
            .iter()
            .filter(|m| m.channel == channel && (include_deleted || !m.deleted))
            .cloned()
            .collect();
        // Keep only the newest `limit`, oldest→newest.
        let skip = matching.len().saturating_sub(limit.max(0) as usize);
        Ok(matching.split_off(skip))
    }

    async fn mark_deleted(&self, message_id: Uuid, requester_id: Uuid) -> Result<ChatMessage> {
        let mut rows = self.rows.write().await;
        let msg = rows
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| Error::NotFound(format!("message {}", message_id)))?;
        if msg.author_id != requester_id {
            return Err(Error::Forbidden(
                "only the author may delete a message".to_string(),
            ));
        }
        msg.deleted = true;
        Ok(msg.clone())
    }
}

/// In-memory [`ConversationRepository`].
#[derive(Default, Clone)]
pub struct MemConversationRepository {
    turns: Arc<RwLock<HashMap<Uuid, Vec<MemoryTurn>>>>,
}

impl MemConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for MemConversationRepository {
    async fn window(&self, owner_id: Uuid, limit: i64) -> Result<Vec<MemoryTurn>> {
        let turns = self.turns.read().await;
        let Some(list) = turns.get(&owner_id) else {
            return Ok(Vec::new());
        };
        let skip = list.len().saturating_sub(limit.max(0) as usize);
        Ok(list[skip..].to_vec())
    }

    async fn append_turn(&self, owner_id: Uuid, role: TurnRole, content: &str) -> Result<()> {
        self.turns
            .write()
            .await
            .entry(owner_id)
            .or_default()
            .push(MemoryTurn {
                role,
                content: content.to_string(),
            });
        Ok(())
    }

    async fn clear(&self, owner_id: Uuid) -> Result<()> {
        if let Some(list) = self.turns.write().await.get_mut(&owner_id) {
            list.clear();
        }
        Ok(())
    }
}

/// In-memory [`DocumentRepository`] with a write path for tests and the
/// external upload collaborator.
#[derive(Default, Clone)]
pub struct MemDocumentRepository {
    docs: Arc<RwLock<Vec<Document>>>,
}

impl MemDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, doc: Document) {
        self.docs.write().await.push(doc);
    }
}

#[async_trait]
impl DocumentRepository for MemDocumentRepository {
    async fn processed_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        Ok(self
            .docs
            .read()
            .await
            .iter()
            .filter(|d| d.owner_id == owner_id && d.processed)
            .cloned()
            .collect())
    }
}

/// In-memory [`SessionResolver`] with a registration path for tests.
#[derive(Default, Clone)]
pub struct MemSessionResolver {
    sessions: Arc<RwLock<HashMap<String, Identity>>>,
}

impl MemSessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, token: impl Into<String>, identity: Identity) {
        self.sessions.write().await.insert(token.into(), identity);
    }
}

#[async_trait]
impl SessionResolver for MemSessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }
}
