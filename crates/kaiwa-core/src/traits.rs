//! Core repository traits for kaiwa abstractions.
//!
//! These traits define the read/write contracts that concrete store
//! implementations must satisfy, enabling pluggable backends and
//! testability. The Postgres implementations live in `kaiwa-db`; in-memory
//! implementations back unit tests and database-less operation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Repository for persisted chat messages.
///
/// Messages are logically deleted, never physically removed; privileged
/// readers (AI-facing) opt into deleted rows with `include_deleted`.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message, assigning a server-generated id and creation
    /// timestamp. Returns the persisted record. A failure here must abort
    /// the send; no broadcast may happen for an unpersisted message.
    async fn append(&self, msg: NewChatMessage) -> Result<ChatMessage>;

    /// Fetch at most `limit` messages for `channel`, ordered oldest→newest.
    /// Logically-deleted rows are excluded unless `include_deleted` is set.
    async fn find_recent(
        &self,
        channel: Channel,
        limit: i64,
        include_deleted: bool,
    ) -> Result<Vec<ChatMessage>>;

    /// Flip `deleted` on a message, returning the updated record.
    ///
    /// Fails with `NotFound` if no such message exists and with `Forbidden`
    /// if `requester_id` is not the author. Re-marking an already-deleted
    /// message succeeds trivially; the flag never reverts. Callers that fan
    /// out a deletion notice must take the channel from the returned record,
    /// never from client input.
    async fn mark_deleted(&self, message_id: Uuid, requester_id: Uuid) -> Result<ChatMessage>;
}

/// Repository for per-identity rolling AI conversation memory.
///
/// Every operation is keyed strictly by the caller's own identity; no
/// cross-owner read path exists.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Last `limit` turns for `owner_id`, oldest→newest. Empty if no memory
    /// record exists yet.
    async fn window(&self, owner_id: Uuid, limit: i64) -> Result<Vec<MemoryTurn>>;

    /// Append one turn, lazily creating the memory record on first use.
    async fn append_turn(&self, owner_id: Uuid, role: TurnRole, content: &str) -> Result<()>;

    /// Truncate the owner's turns to empty. No-op if no record exists.
    async fn clear(&self, owner_id: Uuid) -> Result<()>;
}

/// Read-only access to the uploaded document corpus.
///
/// Documents are created by the external upload collaborator; the context
/// assembly pipeline only ever reads them.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// All processed documents owned by `owner_id`.
    async fn processed_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>>;
}

/// Resolves an opaque session token to an authenticated identity.
///
/// The login flow that mints tokens is an external collaborator; this is the
/// only auth surface the core depends on. Resolution happens exactly once per
/// connection handshake (or per HTTP request) and the result is carried by
/// reference from then on.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// `None` means the token is unknown or expired; callers must fail
    /// closed.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>>;
}
