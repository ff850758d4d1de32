//! LLM client abstraction: chat models that return text and optional tool calls.
//!
//! [`ChatOllama`] talks to a local Ollama server; [`MockLlm`] replays scripted
//! replies for tests. Embedders live alongside in [`Embedder`].

mod embedder;
mod mock;
mod ollama;

pub use embedder::{Embedder, OllamaEmbedder, DEFAULT_EMBED_MODEL};
pub use mock::MockLlm;
pub use ollama::{ollama_base_url, ChatOllama, DEFAULT_OLLAMA_HOST};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;
use crate::tool_source::ToolSpec;

/// One native tool call requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub name: String,
    /// Arguments object as sent by the model.
    pub arguments: Value,
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Assistant reply: text plus any tool calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Chat model seam used by every recipe node.
///
/// **Interaction**: Nodes hold `Arc<dyn LlmClient>`; the CLI builds a
/// `ChatOllama`, tests a `MockLlm`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;

    /// Invoke with tool definitions. Clients without native tool calling ignore `tools`.
    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        self.invoke(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubLlm;

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
            Ok(LlmResponse::text(format!("{} messages", messages.len())))
        }
    }

    /// **Scenario**: Default invoke_with_tools ignores tools and delegates to invoke.
    #[tokio::test]
    async fn invoke_with_tools_defaults_to_invoke() {
        let out = StubLlm
            .invoke_with_tools(&[Message::user("hi")], &[])
            .await
            .unwrap();
        assert_eq!(out.content, "1 messages");
        assert!(out.tool_calls.is_empty());
    }
}
