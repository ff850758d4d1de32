//! Text embeddings: the `Embedder` trait and the Ollama `/api/embed` client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::AgentError;

use super::ollama_base_url;

pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AgentError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AgentError> {
        self.embed(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Llm("embedding response was empty".into()))
    }
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    pub model: String,
    base_url: String,
}

impl Default for OllamaEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_MODEL)
    }
}

impl OllamaEmbedder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            base_url: ollama_base_url(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AgentError> {
        let url = format!("{}/api/embed", self.base_url);
        tracing::debug!(model = %self.model, inputs = texts.len(), "ollama embed");
        let res = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .map_err(|e| AgentError::Llm(format!("request to {url} failed: {e}")))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!("Ollama error {status}: {body}")));
        }
        let parsed: EmbedResponse = res
            .json()
            .await
            .map_err(|e| AgentError::Llm(format!("unreadable Ollama reply: {e}")))?;
        if parsed.embeddings.len() != texts.len() {
            return Err(AgentError::Llm(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }
}
