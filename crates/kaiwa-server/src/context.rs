//! Context assembly pipeline.
//!
//! Builds a bounded, source-attributed system prompt for the completion
//! backend from one of the retrieval sources: the caller's processed
//! document corpus, or live web search. A retrieval failure aborts assembly;
//! there is no silent fallback to plain mode.

use std::sync::Arc;

use tracing::debug;

use kaiwa_core::defaults::{DOCUMENT_EXCERPT_CHARS, MAX_SEARCH_RESULTS};
use kaiwa_core::{ContextMode, DocumentRepository, Identity, Result};
use kaiwa_inference::WebSearchBackend;

/// Prompt used when the caller has no processed documents.
const PLAIN_PROMPT: &str = "You are a helpful assistant. Answer the user's \
questions clearly and concisely.";

const DOCUMENTS_PROMPT_HEADER: &str = "You are a helpful assistant. The user \
has uploaded the documents below. Base your answers on them and cite the \
document name when a document is relevant. If the documents do not cover the \
question, say so before answering from general knowledge.\n";

const WEB_PROMPT_HEADER: &str = "You are a helpful assistant. Use the web \
search results below to answer, and cite the result titles you rely on. If \
the results do not cover the question, say so.\n";

/// Assembled system prompt plus the labels of the sources folded into it.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub system_prompt: String,
    pub sources: Vec<String>,
}

/// Builds bounded prompts from retrieval sources.
pub struct ContextBuilder {
    documents: Arc<dyn DocumentRepository>,
    search: Arc<dyn WebSearchBackend>,
}

impl ContextBuilder {
    pub fn new(documents: Arc<dyn DocumentRepository>, search: Arc<dyn WebSearchBackend>) -> Self {
        Self { documents, search }
    }

    /// Assemble the system prompt and source labels for one AI query.
    pub async fn build(
        &self,
        identity: &Identity,
        query: &str,
        mode: ContextMode,
    ) -> Result<AssembledContext> {
        match mode {
            ContextMode::Documents => self.build_from_documents(identity).await,
            ContextMode::Web => self.build_from_web(query).await,
        }
    }

    async fn build_from_documents(&self, identity: &Identity) -> Result<AssembledContext> {
        let docs = self.documents.processed_for_owner(identity.id).await?;
        if docs.is_empty() {
            debug!(
                subsystem = "server",
                component = "context",
                user_id = %identity.id,
                "No processed documents, using plain prompt"
            );
            return Ok(AssembledContext {
                system_prompt: PLAIN_PROMPT.to_string(),
                sources: Vec::new(),
            });
        }

        let mut prompt = String::from(DOCUMENTS_PROMPT_HEADER);
        let mut sources = Vec::with_capacity(docs.len());
        for doc in &docs {
            prompt.push_str("\n### ");
            prompt.push_str(&doc.original_name);
            prompt.push('\n');
            prompt.push_str(excerpt(&doc.extracted_text, DOCUMENT_EXCERPT_CHARS));
            prompt.push('\n');
            sources.push(doc.original_name.clone());
        }

        Ok(AssembledContext {
            system_prompt: prompt,
            sources,
        })
    }

    async fn build_from_web(&self, query: &str) -> Result<AssembledContext> {
        let results = self.search.search(query, MAX_SEARCH_RESULTS).await?;

        let mut prompt = String::from(WEB_PROMPT_HEADER);
        let mut sources = Vec::with_capacity(results.len());
        for result in &results {
            prompt.push_str("\n### ");
            prompt.push_str(&result.title);
            prompt.push('\n');
            prompt.push_str(&result.snippet);
            prompt.push('\n');
            prompt.push_str(&result.link);
            prompt.push('\n');
            sources.push(result.title.clone());
        }

        Ok(AssembledContext {
            system_prompt: prompt,
            sources,
        })
    }
}

/// Truncate to at most `max_chars` characters without splitting a character.
fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaiwa_core::{Document, Error, Role};
    use kaiwa_db::mem::MemDocumentRepository;
    use kaiwa_inference::{MockSearchBackend, SearchResult};
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            display_name: "z".to_string(),
            avatar_url: None,
            role: Role::Member,
        }
    }

    #[tokio::test]
    async fn test_documents_mode_without_documents_is_plain() {
        let builder = ContextBuilder::new(
            Arc::new(MemDocumentRepository::new()),
            Arc::new(MockSearchBackend::new()),
        );
        let ctx = builder
            .build(&identity(), "anything", ContextMode::Documents)
            .await
            .unwrap();
        assert_eq!(ctx.system_prompt, PLAIN_PROMPT);
        assert!(ctx.sources.is_empty());
    }

    #[tokio::test]
    async fn test_documents_mode_labels_each_document() {
        let docs = MemDocumentRepository::new();
        let who = identity();
        for name in ["alpha.pdf", "beta.docx"] {
            docs.insert(Document {
                id: Uuid::new_v4(),
                owner_id: who.id,
                original_name: name.to_string(),
                extracted_text: format!("contents of {}", name),
                processed: true,
            })
            .await;
        }
        let builder =
            ContextBuilder::new(Arc::new(docs), Arc::new(MockSearchBackend::new()));
        let ctx = builder
            .build(&who, "q", ContextMode::Documents)
            .await
            .unwrap();
        assert!(ctx.system_prompt.contains("### alpha.pdf"));
        assert!(ctx.system_prompt.contains("contents of beta.docx"));
        assert_eq!(ctx.sources, vec!["alpha.pdf", "beta.docx"]);
    }

    #[tokio::test]
    async fn test_web_mode_sources_are_result_titles() {
        let search = MockSearchBackend::new().with_results(vec![
            SearchResult {
                title: "Rust book".to_string(),
                snippet: "the language".to_string(),
                link: "https://example.com/rust".to_string(),
            },
            SearchResult {
                title: "Tokio docs".to_string(),
                snippet: "async runtime".to_string(),
                link: "https://example.com/tokio".to_string(),
            },
        ]);
        let builder =
            ContextBuilder::new(Arc::new(MemDocumentRepository::new()), Arc::new(search));
        let ctx = builder
            .build(&identity(), "rust async", ContextMode::Web)
            .await
            .unwrap();
        assert_eq!(ctx.sources, vec!["Rust book", "Tokio docs"]);
        assert!(ctx.system_prompt.contains("https://example.com/tokio"));
    }

    #[tokio::test]
    async fn test_web_mode_search_failure_surfaces_retrieval_failed() {
        let builder = ContextBuilder::new(
            Arc::new(MemDocumentRepository::new()),
            Arc::new(MockSearchBackend::new().failing()),
        );
        let err = builder
            .build(&identity(), "q", ContextMode::Web)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RetrievalFailed(_)));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("こんにちは", 3), "こんに");
        assert_eq!(excerpt("short", 100), "short");
    }
}
