//! Domain models for kaiwa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown role: {}",
                other
            ))),
        }
    }
}

/// Authenticated principal, independent of any single connection.
///
/// Created on first successful external login; immutable for the lifetime
/// of a connection session. Role changes happen through an external
/// administrative process and take effect on the next session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Named broadcast scope with its own authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    General,
    Admin,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Self::General),
            "admin" => Ok(Self::Admin),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown channel: {}",
                other
            ))),
        }
    }
}

/// A persisted chat message.
///
/// Messages are never physically removed. `deleted` flips false→true exactly
/// once via an authorized delete request and never reverts; deleted rows stay
/// visible to privileged readers that opt in with `include_deleted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
    pub text: String,
    pub channel: Channel,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for appending a new message; id and timestamp are assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub author_id: Uuid,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
    pub text: String,
    pub channel: Channel,
}

/// An uploaded document owned by exactly one identity.
///
/// Written by the external upload collaborator; read-only to the context
/// assembly pipeline. Only documents with `processed == true` carry usable
/// extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub original_name: String,
    pub extracted_text: String,
    pub processed: bool,
}

/// Role of a conversation-memory turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for TurnRole {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown turn role: {}",
                other
            ))),
        }
    }
}

/// One turn of per-identity conversation memory.
///
/// Ordering is insertion order = chronological order; turns are append-only
/// except for an explicit clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryTurn {
    pub role: TurnRole,
    pub content: String,
}

/// Retrieval mode for an AI query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Augment from the caller's processed document corpus.
    Documents,
    /// Augment from live web search.
    Web,
}

/// Facilitator command, parsed once at the boundary and matched exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum FacilitatorCommand {
    /// Summarize the recent discussion.
    Summarize,
    /// Extract meeting minutes (decisions, action items).
    ExtractMinutes,
    /// Organize the discussion into topics.
    Organize,
    /// Find messages mentioning a keyword.
    KeywordSearch { term: String },
    /// Answer a free-form question against the discussion.
    FreeQuestion { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_round_trip() {
        for (s, ch) in [("general", Channel::General), ("admin", Channel::Admin)] {
            assert_eq!(s.parse::<Channel>().unwrap(), ch);
            assert_eq!(ch.to_string(), s);
        }
        assert!("lobby".parse::<Channel>().is_err());
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_facilitator_command_deserialize_tagged() {
        let cmd: FacilitatorCommand =
            serde_json::from_str(r#"{"command":"keywordSearch","term":"deadline"}"#).unwrap();
        assert_eq!(
            cmd,
            FacilitatorCommand::KeywordSearch {
                term: "deadline".to_string()
            }
        );

        let cmd: FacilitatorCommand = serde_json::from_str(r#"{"command":"summarize"}"#).unwrap();
        assert_eq!(cmd, FacilitatorCommand::Summarize);
    }

    #[test]
    fn test_facilitator_command_rejects_unknown() {
        assert!(serde_json::from_str::<FacilitatorCommand>(r#"{"command":"selfDestruct"}"#).is_err());
    }
}
