//! The conversational retrieval session: one corpus, one model, one
//! owned history.

use crate::chain::RetrievalQaChain;
use crate::config::SessionConfig;
use crate::errors::SessionError;
use crate::history::{ChatHistory, ChatTurn};
use crate::llm;
use crate::rag;

/// A chat session over one corpus and one model.
///
/// Sessions are single-caller: `answer` takes `&mut self`, so
/// interleaved calls from several owners do not compile. Run one
/// session per conversation instead of sharing one.
#[derive(Debug)]
pub struct ChatSession {
    config: SessionConfig,
    chain: RetrievalQaChain,
    history: ChatHistory,
}

impl ChatSession {
    /// Build a session from its configuration with a fresh history.
    ///
    /// Construction order is fixed: validate, build the retriever,
    /// build the chat model, bind the chain. A failure at any step
    /// propagates untranslated and nothing later runs.
    pub async fn open(config: SessionConfig) -> Result<Self, SessionError> {
        Self::open_with_history(config, ChatHistory::new()).await
    }

    /// Like [`ChatSession::open`], seeding the history with turns kept
    /// from an earlier session.
    pub async fn open_with_history(
        config: SessionConfig,
        history: ChatHistory,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let retriever = rag::build_retriever(&config).await?;
        let model = llm::build_chat_model(&config)?;
        let chain = RetrievalQaChain::new(retriever, model, config.top_k);

        tracing::info!("session open: model {}, top_k {}", config.model, config.top_k);
        Ok(Self {
            config,
            chain,
            history,
        })
    }

    /// Ask one question; returns the answer and the history as it
    /// stands after the exchange.
    ///
    /// The empty question short-circuits to `("", history)` without
    /// touching retriever or model. Otherwise the chain answers with
    /// the full accumulated history as conversational context, and the
    /// (question, answer) pair is appended only once the chain has
    /// succeeded. A failed call leaves the history exactly as it was.
    pub async fn answer(
        &mut self,
        question: &str,
    ) -> Result<(String, Vec<ChatTurn>), SessionError> {
        if question.is_empty() {
            return Ok((String::new(), self.history.to_vec()));
        }

        let answer = self.chain.answer(question, self.history.turns()).await?;
        self.history.push(question, answer.clone());

        tracing::debug!("turn {} recorded", self.history.len());
        Ok((answer, self.history.to_vec()))
    }

    /// Forget every recorded turn. Idempotent.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// The most recent `history_len` turns in chronological order.
    ///
    /// A read-only view: answering never applies this bound to the
    /// stored log, which grows until [`ChatSession::clear_history`].
    pub fn windowed_history(&self) -> &[ChatTurn] {
        self.history.window(self.config.history_len)
    }

    /// Full history in insertion order.
    pub fn history(&self) -> &[ChatTurn] {
        self.history.turns()
    }

    /// The configuration the session was opened with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::llm::{ChatMessage, ChatModel};
    use crate::rag::{Document, Retriever, ScoredDocument};

    #[derive(Default)]
    struct StubRetriever {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<ScoredDocument>, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ScoredDocument {
                document: Document {
                    id: "c1".into(),
                    content: "Context snippet.".into(),
                    source: "corpus.txt".into(),
                },
                score: 0.9,
            }])
        }
    }

    #[derive(Default)]
    struct StubModel {
        calls: AtomicUsize,
        fail: AtomicBool,
        last_message_count: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for StubModel {
        fn family(&self) -> &str {
            "stub"
        }

        async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, SessionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.last_message_count.store(messages.len(), Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(SessionError::Provider("model offline".into()));
            }
            Ok(format!("answer-{n}"))
        }
    }

    fn stub_session(history_len: usize) -> (ChatSession, Arc<StubRetriever>, Arc<StubModel>) {
        let retriever = Arc::new(StubRetriever::default());
        let model = Arc::new(StubModel::default());
        let config = SessionConfig {
            history_len,
            ..SessionConfig::new("stub-model")
        };
        let chain = RetrievalQaChain::new(retriever.clone(), model.clone(), config.top_k);
        let session = ChatSession {
            config,
            chain,
            history: ChatHistory::new(),
        };
        (session, retriever, model)
    }

    #[tokio::test]
    async fn empty_question_short_circuits() {
        let (mut session, retriever, model) = stub_session(3);

        let (answer, history) = session.answer("").await.unwrap();
        assert_eq!(answer, "");
        assert!(history.is_empty());
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        session.answer("real question").await.unwrap();
        let (_, history) = session.answer("").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn answer_appends_the_exchange() {
        let (mut session, _, _) = stub_session(3);

        let (answer, history) = session.answer("What is X?").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "What is X?");
        assert_eq!(history[0].answer, answer);
        assert_eq!(session.history(), history.as_slice());
    }

    #[tokio::test]
    async fn windowed_history_returns_recent_suffix() {
        let (mut session, _, _) = stub_session(2);

        session.answer("q1").await.unwrap();
        session.answer("q2").await.unwrap();

        // two turns, window of two: everything is still visible
        let window = session.windowed_history();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].question, "q1");
        assert_eq!(window[1].question, "q2");

        session.answer("q3").await.unwrap();

        assert_eq!(session.history().len(), 3);
        let window = session.windowed_history();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].question, "q2");
        assert_eq!(window[1].question, "q3");
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn window_wider_than_history_returns_all() {
        let (mut session, _, _) = stub_session(10);

        session.answer("q1").await.unwrap();
        session.answer("q2").await.unwrap();

        assert_eq!(session.windowed_history().len(), 2);
    }

    #[tokio::test]
    async fn zero_window_is_always_empty() {
        let (mut session, _, _) = stub_session(0);

        session.answer("q1").await.unwrap();
        assert!(session.windowed_history().is_empty());
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn clear_history_resets_and_session_stays_usable() {
        let (mut session, _, _) = stub_session(2);

        session.answer("q1").await.unwrap();
        session.answer("q2").await.unwrap();
        session.clear_history();

        assert!(session.history().is_empty());
        assert!(session.windowed_history().is_empty());

        session.clear_history();
        assert!(session.history().is_empty());

        let (_, history) = session.answer("q3").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "q3");
    }

    #[tokio::test]
    async fn failed_answer_leaves_history_untouched() {
        let (mut session, _, model) = stub_session(2);

        session.answer("q1").await.unwrap();

        model.fail.store(true, Ordering::SeqCst);
        let err = session.answer("q2").await.unwrap_err();
        assert!(matches!(err, SessionError::Provider(_)));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].question, "q1");

        model.fail.store(false, Ordering::SeqCst);
        let (_, history) = session.answer("q2 again").await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn chain_sees_full_history_not_the_window() {
        let (mut session, _, model) = stub_session(1);

        session.answer("q1").await.unwrap();
        session.answer("q2").await.unwrap();
        session.answer("q3").await.unwrap();
        session.answer("q4").await.unwrap();

        // system prompt + three prior turns as pairs + the question
        assert_eq!(model.last_message_count.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn open_rejects_invalid_config_before_any_wiring() {
        let err = ChatSession::open(SessionConfig::new("")).await.unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[tokio::test]
    async fn open_rejects_unresolvable_model() {
        let mut config = SessionConfig::new("mystery-model");
        config.embedding = "ollama".into();
        let err = ChatSession::open(config).await.unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[tokio::test]
    async fn open_wires_an_offline_session_without_corpus() {
        let mut config = SessionConfig::new("llama3");
        config.embedding = "ollama".into();

        let mut session = ChatSession::open(config).await.unwrap();
        assert_eq!(session.config().model, "llama3");
        let (answer, history) = session.answer("").await.unwrap();
        assert_eq!(answer, "");
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn seeded_history_is_visible_and_growable() {
        let retriever = Arc::new(StubRetriever::default());
        let model = Arc::new(StubModel::default());
        let seeded = ChatHistory::from_turns(vec![ChatTurn::new("old q", "old a")]);
        let config = SessionConfig {
            history_len: 2,
            ..SessionConfig::new("stub-model")
        };
        let chain = RetrievalQaChain::new(retriever, model, config.top_k);
        let mut session = ChatSession {
            config,
            chain,
            history: seeded,
        };

        assert_eq!(session.history().len(), 1);
        let (_, history) = session.answer("new q").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "old q");
    }
}
