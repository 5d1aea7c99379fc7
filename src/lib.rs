//! Conversational question answering over a local document corpus.
//!
//! A [`ChatSession`] wires three capabilities together: an embedder
//! and vector store behind a [`rag::Retriever`], a [`llm::ChatModel`]
//! resolved from the configured model identifier, and a
//! [`RetrievalQaChain`] that performs one retrieval and one generation
//! per question. The session threads a bounded view of its
//! (question, answer) history into each exchange and owns that history
//! for its whole lifetime.
//!
//! ```ignore
//! let mut config = SessionConfig::new("llama3");
//! config.embedding = "ollama".into();
//! config.corpus_path = Some("./docs".into());
//! config.history_len = 4;
//!
//! let mut session = ChatSession::open(config).await?;
//! let (answer, _history) = session.answer("What does the corpus say about X?").await?;
//! ```

pub mod chain;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod history;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod session;

pub use chain::RetrievalQaChain;
pub use config::{Credentials, SessionConfig};
pub use errors::SessionError;
pub use history::{ChatHistory, ChatTurn};
pub use session::ChatSession;
