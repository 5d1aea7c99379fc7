//! Embeddings from a local Ollama daemon.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::errors::SessionError;

use super::Embedder;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "nomic-embed-text";

pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

pub(super) fn build(config: &SessionConfig) -> Result<Arc<dyn Embedder>, SessionError> {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let model = config
        .embedding_model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    Ok(Arc::new(OllamaEmbedder::new(base_url, model)))
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn strategy(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SessionError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
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
            tracing::warn!("ollama embeddings failed ({status}): {text}");
            return Err(SessionError::Provider(format!(
                "ollama embeddings failed ({status}): {text}"
            )));
        }

        let payload: Value = res.json().await.map_err(SessionError::provider)?;
        let data = payload["embeddings"].as_array().ok_or_else(|| {
            SessionError::Provider("ollama embeddings response carried no vectors".into())
        })?;

        let mut embeddings = Vec::with_capacity(data.len());
        for entry in data {
            let vector = entry
                .as_array()
                .ok_or_else(|| {
                    SessionError::Provider("ollama embeddings entry was not an array".into())
                })?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();
            embeddings.push(vector);
        }

        if embeddings.len() != texts.len() {
            return Err(SessionError::Provider(format!(
                "ollama embeddings returned {} vectors for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs `ollama serve` with nomic-embed-text pulled.
    #[tokio::test]
    #[ignore]
    async fn live_embed_round_trip() {
        let embedder = OllamaEmbedder::new(DEFAULT_BASE_URL, DEFAULT_MODEL);
        let vectors = embedder
            .embed(&["hello world".to_string(), "goodbye world".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(!vectors[0].is_empty());
    }
}
