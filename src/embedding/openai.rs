//! Embeddings over the OpenAI-compatible `/v1/embeddings` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::errors::SessionError;

use super::Embedder;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

pub(super) fn build(config: &SessionConfig) -> Result<Arc<dyn Embedder>, SessionError> {
    let api_key = config.credentials.api_key.clone().ok_or_else(|| {
        SessionError::Config("openai embedding strategy requires the api_key credential".into())
    })?;
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let model = config
        .embedding_model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    Ok(Arc::new(OpenAiEmbedder::new(base_url, api_key, model)))
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn strategy(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SessionError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
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
            tracing::warn!("openai embeddings failed ({status}): {text}");
            return Err(SessionError::Provider(format!(
                "openai embeddings failed ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(SessionError::provider)?;
        let data = payload["data"].as_array().ok_or_else(|| {
            SessionError::Provider("openai embeddings response carried no data array".into())
        })?;

        let mut embeddings = Vec::with_capacity(data.len());
        for entry in data {
            let vector = entry["embedding"]
                .as_array()
                .ok_or_else(|| {
                    SessionError::Provider("openai embeddings entry carried no vector".into())
                })?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();
            embeddings.push(vector);
        }

        if embeddings.len() != texts.len() {
            return Err(SessionError::Provider(format!(
                "openai embeddings returned {} vectors for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}
