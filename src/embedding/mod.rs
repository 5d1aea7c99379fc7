//! Embedding capability and the strategy registry.
//!
//! Parallel in shape to the chat-model registry: the `embedding` field
//! of the config names a strategy, the table row for that strategy
//! builds the embedder. Vectors produced by different strategies are
//! not comparable, so a store ingested under one strategy must be
//! cleared before switching.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::errors::SessionError;

/// Text-to-vector capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Strategy identifier this embedder was built from.
    fn strategy(&self) -> &str;

    /// Embedding model name in use.
    fn model(&self) -> &str;

    /// Embed a batch of texts. One vector per input, input order kept.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SessionError>;
}

impl std::fmt::Debug for dyn Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("strategy", &self.strategy())
            .field("model", &self.model())
            .finish_non_exhaustive()
    }
}

/// Identifies an embedding space: vectors are only comparable when
/// both sides carry the same signature.
pub fn signature(embedder: &dyn Embedder) -> String {
    format!("{}/{}", embedder.strategy(), embedder.model())
}

type BuildFn = fn(&SessionConfig) -> Result<Arc<dyn Embedder>, SessionError>;

struct Strategy {
    name: &'static str,
    build: BuildFn,
}

static STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "openai",
        build: openai::build,
    },
    Strategy {
        name: "ollama",
        build: ollama::build,
    },
];

/// Build the embedder named by `config.embedding`.
pub fn build_embedder(config: &SessionConfig) -> Result<Arc<dyn Embedder>, SessionError> {
    let name = config.embedding.as_str();
    let strategy = STRATEGIES
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| SessionError::Config(format!("unknown embedding strategy: {name}")))?;
    (strategy.build)(config)
}
