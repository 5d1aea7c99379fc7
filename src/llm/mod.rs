//! Chat-model capability and the provider family registry.
//!
//! A [`ChatModel`] is bound to one model identifier, temperature and
//! credential set at construction time. The registry maps a model
//! identifier (or an explicit `provider` override) to the family that
//! knows how to build it; adding a family means adding a table row.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaChat;
pub use openai::OpenAiChat;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::errors::SessionError;

/// One message in provider wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion capability bound to one model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider family name, e.g. `openai` or `ollama`.
    fn family(&self) -> &str;

    /// One completion round trip. No retries; errors bubble up as-is.
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, SessionError>;
}

impl std::fmt::Debug for dyn ChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModel")
            .field("family", &self.family())
            .finish_non_exhaustive()
    }
}

type BuildFn = fn(&SessionConfig) -> Result<Arc<dyn ChatModel>, SessionError>;

struct ProviderFamily {
    name: &'static str,
    /// Model-identifier prefixes claimed by this family.
    prefixes: &'static [&'static str],
    build: BuildFn,
}

static FAMILIES: &[ProviderFamily] = &[
    ProviderFamily {
        name: "openai",
        prefixes: &["gpt-", "chatgpt-", "o1", "o3", "o4"],
        build: openai::build,
    },
    ProviderFamily {
        name: "ollama",
        prefixes: &["llama", "qwen", "mistral", "gemma", "phi", "deepseek"],
        build: ollama::build,
    },
];

fn resolve_family(config: &SessionConfig) -> Result<&'static ProviderFamily, SessionError> {
    if let Some(name) = &config.provider {
        return FAMILIES
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SessionError::Config(format!("unknown provider family: {name}")));
    }
    FAMILIES
        .iter()
        .find(|f| f.prefixes.iter().any(|p| config.model.starts_with(p)))
        .ok_or_else(|| {
            SessionError::Config(format!(
                "no provider family claims model {:?}; set `provider` explicitly",
                config.model
            ))
        })
}

/// Build the chat capability for the configured model.
pub fn build_chat_model(config: &SessionConfig) -> Result<Arc<dyn ChatModel>, SessionError> {
    let family = resolve_family(config)?;
    let model = (family.build)(config)?;
    tracing::debug!("chat model {} resolved to {} family", config.model, family.name);
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(model: &str) -> SessionConfig {
        let mut config = SessionConfig::new(model);
        config.credentials.api_key = Some("sk-test".into());
        config
    }

    #[test]
    fn gpt_prefix_resolves_to_openai() {
        let model = build_chat_model(&config_with_key("gpt-4o-mini")).unwrap();
        assert_eq!(model.family(), "openai");
    }

    #[test]
    fn llama_prefix_resolves_to_ollama() {
        let model = build_chat_model(&SessionConfig::new("llama3.1:8b")).unwrap();
        assert_eq!(model.family(), "ollama");
    }

    #[test]
    fn explicit_provider_beats_prefix() {
        let mut config = SessionConfig::new("gpt-oss:20b");
        config.provider = Some("ollama".into());
        let model = build_chat_model(&config).unwrap();
        assert_eq!(model.family(), "ollama");
    }

    #[test]
    fn unknown_model_is_a_config_error() {
        let err = build_chat_model(&SessionConfig::new("mystery-model")).unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let mut config = SessionConfig::new("gpt-4o-mini");
        config.provider = Some("skynet".into());
        let err = build_chat_model(&config).unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn openai_without_key_is_a_config_error() {
        let err = build_chat_model(&SessionConfig::new("gpt-4o-mini")).unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }
}
