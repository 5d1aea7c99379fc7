//! Session configuration: model selection, retrieval knobs, credentials.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::SessionError;

const ENV_API_KEY: &str = "RAGCHAT_API_KEY";
const ENV_API_SECRET: &str = "RAGCHAT_API_SECRET";
const ENV_APP_ID: &str = "RAGCHAT_APP_ID";

/// Opaque provider secrets.
///
/// Which fields a provider family requires is that family's business;
/// unused fields stay `None` and are never validated here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
}

impl Credentials {
    /// Read secrets from the `RAGCHAT_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: env::var(ENV_API_KEY).ok(),
            api_secret: env::var(ENV_API_SECRET).ok(),
            app_id: env::var(ENV_APP_ID).ok(),
        }
    }

    /// Fill any unset field from the environment. Explicit values win.
    pub fn fill_from_env(&mut self) {
        let fallback = Self::from_env();
        if self.api_key.is_none() {
            self.api_key = fallback.api_key;
        }
        if self.api_secret.is_none() {
            self.api_secret = fallback.api_secret;
        }
        if self.app_id.is_none() {
            self.app_id = fallback.app_id;
        }
    }
}

fn default_top_k() -> usize {
    4
}

fn default_embedding() -> String {
    "openai".to_string()
}

/// Immutable configuration a session is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Model identifier, e.g. `gpt-4o-mini` or `llama3`.
    pub model: String,
    /// Sampling temperature. Must be finite and non-negative.
    #[serde(default)]
    pub temperature: f32,
    /// Documents retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Turns served by `windowed_history`. 0 keeps the window empty.
    /// Answering never applies this bound on its own.
    #[serde(default)]
    pub history_len: usize,
    /// Directory of corpus files to ingest when the store is empty.
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,
    /// Vector store database file. `None` keeps the store in memory.
    #[serde(default)]
    pub persist_path: Option<PathBuf>,
    /// Embedding strategy identifier.
    #[serde(default = "default_embedding")]
    pub embedding: String,
    /// Overrides the strategy's default embedding model name.
    #[serde(default)]
    pub embedding_model: Option<String>,
    /// Explicit provider family. Bypasses model-prefix matching.
    #[serde(default)]
    pub provider: Option<String>,
    /// Endpoint override for the resolved provider family.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub credentials: Credentials,
}

impl SessionConfig {
    /// A config with defaults for everything but the model identifier.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            top_k: default_top_k(),
            history_len: 0,
            corpus_path: None,
            persist_path: None,
            embedding: default_embedding(),
            embedding_model: None,
            provider: None,
            base_url: None,
            credentials: Credentials::default(),
        }
    }

    /// Load a YAML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            SessionError::Config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&raw).map_err(|e| {
            SessionError::Config(format!("cannot parse config {}: {}", path.display(), e))
        })
    }

    /// Construction-time invariants. Everything else is checked by the
    /// component that consumes the field.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.model.trim().is_empty() {
            return Err(SessionError::Config("model identifier is empty".into()));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(SessionError::Config(format!(
                "temperature must be finite and >= 0, got {}",
                self.temperature
            )));
        }
        if self.top_k == 0 {
            return Err(SessionError::Config("top_k must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_applies_defaults() {
        let config: SessionConfig = serde_yaml::from_str("model: gpt-4o-mini").unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.history_len, 0);
        assert_eq!(config.embedding, "openai");
        assert!(config.persist_path.is_none());
        assert!(config.credentials.api_key.is_none());
    }

    #[test]
    fn full_yaml_round_trips() {
        let raw = "
model: llama3
temperature: 0.7
top_k: 2
history_len: 6
corpus_path: ./docs
persist_path: ./store.db
embedding: ollama
base_url: http://localhost:11434
credentials:
  api_key: sk-test
";
        let config: SessionConfig = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.model, "llama3");
        assert_eq!(config.top_k, 2);
        assert_eq!(config.history_len, 6);
        assert_eq!(config.embedding, "ollama");
        assert_eq!(config.corpus_path, Some(PathBuf::from("./docs")));
        assert_eq!(config.credentials.api_key.as_deref(), Some("sk-test"));
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_model() {
        let config = SessionConfig::new("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_temperature() {
        let mut config = SessionConfig::new("gpt-4o-mini");
        config.temperature = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_finite_temperature() {
        let mut config = SessionConfig::new("gpt-4o-mini");
        config.temperature = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_top_k() {
        let mut config = SessionConfig::new("gpt-4o-mini");
        config.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_fills_only_missing_credentials() {
        env::set_var(ENV_API_KEY, "from-env");
        let mut credentials = Credentials {
            api_key: Some("explicit".into()),
            api_secret: None,
            app_id: None,
        };
        credentials.fill_from_env();
        assert_eq!(credentials.api_key.as_deref(), Some("explicit"));
        env::remove_var(ENV_API_KEY);
    }
}
