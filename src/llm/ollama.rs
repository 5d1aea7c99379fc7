//! Chat against a local Ollama daemon.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::errors::SessionError;

use super::{ChatMessage, ChatModel};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaChat {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaChat {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
        }
    }
}

/// Registry constructor. No credentials; the daemon is trusted locally.
pub(super) fn build(config: &SessionConfig) -> Result<Arc<dyn ChatModel>, SessionError> {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    Ok(Arc::new(OllamaChat::new(
        base_url,
        config.model.clone(),
        config.temperature,
    )))
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn family(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, SessionError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(SessionError::provider)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            tracing::warn!("ollama chat failed ({status}): {text}");
            return Err(SessionError::Provider(format!(
                "ollama chat failed ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(SessionError::provider)?;
        payload["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                SessionError::Provider("ollama chat response carried no message content".into())
            })
    }
}
