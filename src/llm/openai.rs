//! OpenAI-compatible chat completions.
//!
//! Also fronts local servers speaking the same protocol (LM Studio,
//! vLLM) when `base_url` points at them.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::errors::SessionError;

use super::{ChatMessage, ChatModel};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        }
    }
}

/// Registry constructor. Requires an `api_key` credential.
pub(super) fn build(config: &SessionConfig) -> Result<Arc<dyn ChatModel>, SessionError> {
    let api_key = config.credentials.api_key.clone().ok_or_else(|| {
        SessionError::Config("openai provider requires the api_key credential".into())
    })?;
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    Ok(Arc::new(OpenAiChat::new(
        base_url,
        api_key,
        config.model.clone(),
        config.temperature,
    )))
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn family(&self) -> &str {
        "openai"
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, SessionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": false,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(SessionError::provider)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            tracing::warn!("openai chat failed ({status}): {text}");
            return Err(SessionError::Provider(format!(
                "openai chat failed ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(SessionError::provider)?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                SessionError::Provider("openai chat response carried no message content".into())
            })
    }
}
