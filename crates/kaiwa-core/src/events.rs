//! Realtime wire-event schema.
//!
//! All WebSocket traffic is JSON with a `type` tag and camelCase payload
//! fields. [`ClientEvent`] covers inbound events from connected clients,
//! [`ServerEvent`] covers everything the server emits. Timestamps cross the
//! wire pre-formatted; the internal `DateTime<Utc>` never leaves the server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Channel, ChatMessage};

/// Inbound events from a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Post a message to a channel.
    #[serde(rename_all = "camelCase")]
    SendMessage { text: String, channel: Channel },
    /// Logically delete one of the sender's own messages. `channel` is the
    /// client's view only; deletion fan-out routes by the stored record.
    #[serde(rename_all = "camelCase")]
    RequestDelete { message_id: Uuid, channel: Channel },
    /// Relay a facilitator response to every other live connection.
    #[serde(rename_all = "camelCase")]
    FacilitatorBroadcast { response: String },
}

/// Outbound events emitted by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A message was persisted and fanned out to the channel subset.
    #[serde(rename_all = "camelCase")]
    MessageReceived {
        id: Uuid,
        text: String,
        author_display_name: String,
        author_avatar_url: Option<String>,
        author_id: Uuid,
        channel: Channel,
        /// Locale-formatted timestamp for direct display.
        created_at: String,
    },
    /// A message was logically deleted.
    #[serde(rename_all = "camelCase")]
    MessageDeleted { message_id: Uuid },
    /// Live connection count, sent on every connect/disconnect.
    #[serde(rename_all = "camelCase")]
    PresenceCount { count: usize },
    /// Facilitator output relayed from another connection.
    #[serde(rename_all = "camelCase")]
    FacilitatorResponse { response: String },
    /// Per-request failure, delivered to the offending sender only.
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

impl ServerEvent {
    /// Build a `messageReceived` event from a persisted message.
    pub fn message_received(msg: &ChatMessage) -> Self {
        Self::MessageReceived {
            id: msg.id,
            text: msg.text.clone(),
            author_display_name: msg.author_display_name.clone(),
            author_avatar_url: msg.author_avatar_url.clone(),
            author_id: msg.author_id,
            channel: msg.channel,
            created_at: crate::defaults::format_wire_timestamp(&msg.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_client_event_send_message_wire_shape() {
        let evt: ClientEvent =
            serde_json::from_str(r#"{"type":"sendMessage","text":"hi","channel":"general"}"#)
                .unwrap();
        match evt {
            ClientEvent::SendMessage { text, channel } => {
                assert_eq!(text, "hi");
                assert_eq!(channel, Channel::General);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_client_event_request_delete_wire_shape() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"type":"requestDelete","messageId":"{}","channel":"admin"}}"#,
            id
        );
        let evt: ClientEvent = serde_json::from_str(&json).unwrap();
        match evt {
            ClientEvent::RequestDelete { message_id, channel } => {
                assert_eq!(message_id, id);
                assert_eq!(channel, Channel::Admin);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_server_event_presence_count_serializes_camel_case() {
        let json = serde_json::to_value(ServerEvent::PresenceCount { count: 3 }).unwrap();
        assert_eq!(json["type"], "presenceCount");
        assert_eq!(json["count"], 3);
    }

    #[test]
    fn test_message_received_carries_formatted_timestamp() {
        let msg = ChatMessage {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_display_name: "alice".to_string(),
            author_avatar_url: None,
            text: "hello".to_string(),
            channel: Channel::General,
            deleted: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(ServerEvent::message_received(&msg)).unwrap();
        assert_eq!(json["type"], "messageReceived");
        assert_eq!(json["authorDisplayName"], "alice");
        assert!(json["createdAt"].is_string());
    }
}
