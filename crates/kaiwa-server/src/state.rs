//! Shared application state.

use std::sync::Arc;

use kaiwa_core::{ConversationRepository, MessageRepository, SessionResolver};

use crate::assistant::Assistant;
use crate::guard::ChannelGuard;
use crate::hub::ConnectionRegistry;
use crate::presence::PresenceTracker;

/// Application state shared across handlers and the WebSocket loop.
#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<dyn MessageRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub sessions: Arc<dyn SessionResolver>,
    /// Single source of truth for channel capability checks.
    pub guard: ChannelGuard,
    /// Live connection set + broadcast router.
    pub registry: Arc<ConnectionRegistry>,
    /// Process-wide live-connection counter.
    pub presence: Arc<PresenceTracker>,
    /// AI orchestrator (context assembly + completion backend).
    pub assistant: Arc<Assistant>,
}
