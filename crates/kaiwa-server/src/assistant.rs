//! AI orchestrator.
//!
//! Assembles context, invokes the completion backend, and records completed
//! exchanges into conversation memory. The facilitator variant builds its
//! prompt from a recent chat-message window instead and persists nothing.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use kaiwa_core::defaults::CONVERSATION_WINDOW;
use kaiwa_core::{
    Channel, ChatMessage, ContextMode, ConversationRepository, FacilitatorCommand, Identity,
    MessageRepository, Result, TurnRole,
};
use kaiwa_inference::{CompletionBackend, PromptMessage};

use crate::context::ContextBuilder;

const FACILITATOR_PROMPT_HEADER: &str = "You are a meeting facilitator \
observing a team chat. Work only from the transcript below.\n\nTranscript:\n";

/// Response of one AI exchange.
#[derive(Debug, Clone)]
pub struct AiReply {
    pub response_text: String,
    pub sources: Vec<String>,
}

/// Orchestrates context assembly, completion calls, and memory writes.
pub struct Assistant {
    completion: Arc<dyn CompletionBackend>,
    context: ContextBuilder,
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl Assistant {
    pub fn new(
        completion: Arc<dyn CompletionBackend>,
        context: ContextBuilder,
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            completion,
            context,
            conversations,
            messages,
        }
    }

    /// Answer a user query with retrieval-augmented context.
    ///
    /// On success both the user turn and the assistant turn are appended to
    /// conversation memory; on any failure nothing is appended, so memory
    /// reflects only completed exchanges. Concurrent requests from the same
    /// identity can interleave between the window read and the appends; this
    /// race is accepted and matches the original behavior.
    pub async fn respond(
        &self,
        identity: &Identity,
        query: &str,
        mode: ContextMode,
    ) -> Result<AiReply> {
        let start = Instant::now();
        let assembled = self.context.build(identity, query, mode).await?;
        let window = self
            .conversations
            .window(identity.id, CONVERSATION_WINDOW)
            .await?;

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(PromptMessage::system(&assembled.system_prompt));
        for turn in &window {
            messages.push(match turn.role {
                TurnRole::User => PromptMessage::user(&turn.content),
                TurnRole::Assistant => PromptMessage::assistant(&turn.content),
            });
        }
        messages.push(PromptMessage::user(query));

        let response = match self.completion.complete(&messages).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    subsystem = "server",
                    component = "assistant",
                    user_id = %identity.id,
                    error = %err,
                    "Completion failed, no turns recorded"
                );
                return Err(err);
            }
        };

        self.conversations
            .append_turn(identity.id, TurnRole::User, query)
            .await?;
        self.conversations
            .append_turn(identity.id, TurnRole::Assistant, &response)
            .await?;

        debug!(
            subsystem = "server",
            component = "assistant",
            op = "respond",
            user_id = %identity.id,
            response_len = response.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "AI exchange recorded"
        );

        Ok(AiReply {
            response_text: response,
            sources: assembled.sources,
        })
    }

    /// Run a facilitator command over a recent window of channel messages.
    ///
    /// Reads include logically-deleted rows (the facilitator sees the full
    /// record) and nothing is written to conversation memory; the output is
    /// meant for transient broadcast.
    pub async fn facilitate(
        &self,
        channel: Channel,
        command: &FacilitatorCommand,
        window_size: i64,
    ) -> Result<String> {
        let history = self
            .messages
            .find_recent(channel, window_size, true)
            .await?;

        let mut system = String::from(FACILITATOR_PROMPT_HEADER);
        if history.is_empty() {
            system.push_str("(no messages)\n");
        }
        for msg in &history {
            system.push_str(&format_transcript_line(msg));
        }

        let instruction = facilitator_instruction(command);
        let messages = [
            PromptMessage::system(system),
            PromptMessage::user(instruction),
        ];
        self.completion.complete(&messages).await
    }
}

fn format_transcript_line(msg: &ChatMessage) -> String {
    format!(
        "[{}] {}: {}\n",
        msg.created_at.format("%H:%M"),
        msg.author_display_name,
        msg.text
    )
}

/// Exhaustive command → instruction mapping.
fn facilitator_instruction(command: &FacilitatorCommand) -> String {
    match command {
        FacilitatorCommand::Summarize => {
            "Summarize the discussion in a few short paragraphs.".to_string()
        }
        FacilitatorCommand::ExtractMinutes => {
            "Extract meeting minutes: decisions made, action items with owners, and open issues."
                .to_string()
        }
        FacilitatorCommand::Organize => {
            "Organize the discussion into topics, listing the key points under each.".to_string()
        }
        FacilitatorCommand::KeywordSearch { term } => format!(
            "List every message that mentions \"{}\", with speaker and context.",
            term
        ),
        FacilitatorCommand::FreeQuestion { text } => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaiwa_core::{Error, NewChatMessage, Role};
    use kaiwa_db::mem::{MemConversationRepository, MemDocumentRepository, MemMessageRepository};
    use kaiwa_inference::{MockCompletionBackend, MockSearchBackend, PromptRole};
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            display_name: "z".to_string(),
            avatar_url: None,
            role: Role::Member,
        }
    }

    struct Fixture {
        assistant: Assistant,
        conversations: MemConversationRepository,
        messages: MemMessageRepository,
        completion: MockCompletionBackend,
    }

    fn fixture(completion: MockCompletionBackend, search: MockSearchBackend) -> Fixture {
        let conversations = MemConversationRepository::new();
        let messages = MemMessageRepository::new();
        let context = ContextBuilder::new(
            Arc::new(MemDocumentRepository::new()),
            Arc::new(search),
        );
        let assistant = Assistant::new(
            Arc::new(completion.clone()),
            context,
            Arc::new(conversations.clone()),
            Arc::new(messages.clone()),
        );
        Fixture {
            assistant,
            conversations,
            messages,
            completion,
        }
    }

    #[tokio::test]
    async fn test_respond_appends_both_turns_on_success() {
        let fx = fixture(
            MockCompletionBackend::new().with_response("42"),
            MockSearchBackend::new(),
        );
        let who = identity();
        let reply = fx
            .assistant
            .respond(&who, "meaning of life?", ContextMode::Documents)
            .await
            .unwrap();
        assert_eq!(reply.response_text, "42");
        assert!(reply.sources.is_empty());

        let window = fx.conversations.window(who.id, 10).await.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].role, TurnRole::User);
        assert_eq!(window[0].content, "meaning of life?");
        assert_eq!(window[1].role, TurnRole::Assistant);
        assert_eq!(window[1].content, "42");
    }

    #[tokio::test]
    async fn test_respond_completion_failure_leaves_memory_untouched() {
        let fx = fixture(MockCompletionBackend::new().failing(), MockSearchBackend::new());
        let who = identity();
        let err = fx
            .assistant
            .respond(&who, "q", ContextMode::Documents)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CompletionFailed(_)));
        assert!(fx.conversations.window(who.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_respond_retrieval_failure_leaves_memory_untouched() {
        let fx = fixture(
            MockCompletionBackend::new(),
            MockSearchBackend::new().failing(),
        );
        let who = identity();
        let err = fx
            .assistant
            .respond(&who, "q", ContextMode::Web)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RetrievalFailed(_)));
        assert!(fx.conversations.window(who.id, 10).await.unwrap().is_empty());
        // The backend was never invoked.
        assert!(fx.completion.calls().is_empty());
    }

    #[tokio::test]
    async fn test_respond_folds_history_window_into_prompt() {
        let fx = fixture(MockCompletionBackend::new(), MockSearchBackend::new());
        let who = identity();
        fx.conversations
            .append_turn(who.id, TurnRole::User, "earlier question")
            .await
            .unwrap();
        fx.conversations
            .append_turn(who.id, TurnRole::Assistant, "earlier answer")
            .await
            .unwrap();

        fx.assistant
            .respond(&who, "follow-up", ContextMode::Documents)
            .await
            .unwrap();

        let calls = fx.completion.calls();
        let prompt = &calls[0];
        assert_eq!(prompt[0].role, PromptRole::System);
        assert_eq!(prompt[1].content, "earlier question");
        assert_eq!(prompt[2].content, "earlier answer");
        assert_eq!(prompt.last().unwrap().content, "follow-up");
    }

    #[tokio::test]
    async fn test_facilitate_reads_deleted_rows_and_persists_nothing() {
        let fx = fixture(
            MockCompletionBackend::new().with_response("minutes"),
            MockSearchBackend::new(),
        );
        let author = Uuid::new_v4();
        let saved = fx
            .messages
            .append(NewChatMessage {
                author_id: author,
                author_display_name: "alice".to_string(),
                author_avatar_url: None,
                text: "we shipped it".to_string(),
                channel: Channel::General,
            })
            .await
            .unwrap();
        fx.messages.mark_deleted(saved.id, author).await.unwrap();

        let out = fx
            .assistant
            .facilitate(Channel::General, &FacilitatorCommand::ExtractMinutes, 30)
            .await
            .unwrap();
        assert_eq!(out, "minutes");

        let calls = fx.completion.calls();
        assert!(calls[0][0].content.contains("we shipped it"));
        // Facilitator output never lands in conversation memory.
        assert!(fx.conversations.window(author, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_facilitate_keyword_search_instruction() {
        let fx = fixture(MockCompletionBackend::new(), MockSearchBackend::new());
        fx.assistant
            .facilitate(
                Channel::General,
                &FacilitatorCommand::KeywordSearch {
                    term: "deadline".to_string(),
                },
                10,
            )
            .await
            .unwrap();
        let calls = fx.completion.calls();
        assert!(calls[0][1].content.contains("\"deadline\""));
    }
}
