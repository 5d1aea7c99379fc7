//! Retrieval-augmented answering: one retrieval, one generation.

use std::sync::Arc;

use crate::errors::SessionError;
use crate::history::ChatTurn;
use crate::llm::{ChatMessage, ChatModel};
use crate::rag::{Retriever, ScoredDocument};

const SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about the user's \
documents. Use the context below. If the context does not contain the answer, say you don't \
know instead of guessing.";

const EMPTY_CONTEXT_NOTE: &str = "No matching documents were found for this question.";

/// Composes the retriever and the chat model into a single
/// question-answering operation.
///
/// Exactly one retrieval and one completion per call. Failures from
/// either collaborator propagate unmodified and nothing is retried.
#[derive(Debug)]
pub struct RetrievalQaChain {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
}

impl RetrievalQaChain {
    pub fn new(retriever: Arc<dyn Retriever>, model: Arc<dyn ChatModel>, top_k: usize) -> Self {
        Self {
            retriever,
            model,
            top_k,
        }
    }

    /// Answer `question` given the prior conversation.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ChatTurn],
    ) -> Result<String, SessionError> {
        let documents = self.retriever.retrieve(question, self.top_k).await?;
        let messages = build_messages(question, history, &documents);
        self.model.chat(messages).await
    }
}

/// Provider wire order: context first, then the conversation so far,
/// then the new question.
fn build_messages(
    question: &str,
    history: &[ChatTurn],
    documents: &[ScoredDocument],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(render_context(documents)));
    for turn in history {
        messages.push(ChatMessage::user(turn.question.as_str()));
        messages.push(ChatMessage::assistant(turn.answer.as_str()));
    }
    messages.push(ChatMessage::user(question));
    messages
}

fn render_context(documents: &[ScoredDocument]) -> String {
    if documents.is_empty() {
        return format!("{SYSTEM_PROMPT}\n\n{EMPTY_CONTEXT_NOTE}");
    }

    let mut context = format!("{SYSTEM_PROMPT}\n\nContext:\n");
    for (i, scored) in documents.iter().enumerate() {
        context.push_str(&format!(
            "[{}] (Source: {}, relevance: {:.2})\n{}\n\n",
            i + 1,
            scored.document.source,
            scored.score,
            scored.document.content
        ));
    }
    context.trim_end().to_string()
}
