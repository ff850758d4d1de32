//! Native Ollama chat client (`POST /api/chat`, non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, LlmUsage, ToolCall};
use crate::message::Message;
use crate::tool_source::ToolSpec;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// `OLLAMA_HOST` if set (a bare `host:port` gets `http://`), else the local default.
pub fn ollama_base_url() -> String {
    match std::env::var("OLLAMA_HOST") {
        Ok(h) if !h.trim().is_empty() => normalize_host(&h),
        _ => DEFAULT_OLLAMA_HOST.to_string(),
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ResponseFunction,
}

#[derive(Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Chat model served by Ollama.
///
/// ```rust,ignore
/// let llm = ChatOllama::new("phi4").with_temperature(0.5);
/// let reply = llm.invoke(&[Message::user("Hi")]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ChatOllama {
    client: reqwest::Client,
    pub model: String,
    pub temperature: f32,
    base_url: String,
    timeout: Option<Duration>,
}

impl ChatOllama {
    /// Client for `model` at [`ollama_base_url`], temperature 0.8 (Ollama's default).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            temperature: 0.8,
            base_url: ollama_base_url(),
            timeout: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_host(&base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(&self, messages: &[Message], tools: &[ToolSpec]) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role(), "content": m.content() }))
            .collect();
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        if !tools.is_empty() {
            let tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description.clone().unwrap_or_default(),
                            "parameters": t.input_schema,
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }
        body
    }

    async fn chat(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<LlmResponse, AgentError> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(model = %self.model, messages = messages.len(), tools = tools.len(), "ollama chat");
        let mut req = self.client.post(&url).json(&self.request_body(messages, tools));
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }
        let res = req
            .send()
            .await
            .map_err(|e| AgentError::Llm(format!("request to {url} failed: {e}")))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!("Ollama error {status}: {body}")));
        }
        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| AgentError::Llm(format!("unreadable Ollama reply: {e}")))?;
        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (None, None) => None,
            (p, c) => {
                let (p, c) = (p.unwrap_or(0), c.unwrap_or(0));
                Some(LlmUsage {
                    prompt_tokens: p,
                    completion_tokens: c,
                    total_tokens: p + c,
                })
            }
        };
        let tool_calls = parsed
            .message
            .tool_calls
            .into_iter()
            .map(|c| ToolCall {
                name: c.function.name,
                arguments: c.function.arguments,
                id: c.id,
            })
            .collect();
        Ok(LlmResponse {
            content: parsed.message.content,
            tool_calls,
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for ChatOllama {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.chat(messages, &[]).await
    }

    async fn invoke_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        self.chat(messages, tools).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Bare host:port gets a scheme; trailing slashes are dropped.
    #[test]
    fn normalize_host_adds_scheme() {
        assert_eq!(normalize_host("127.0.0.1:11434"), "http://127.0.0.1:11434");
        assert_eq!(normalize_host("https://ollama.local/"), "https://ollama.local");
    }

    /// **Scenario**: Tools are only sent when present; temperature goes under options.
    #[test]
    fn request_body_shape() {
        let llm = ChatOllama::new("phi4").with_temperature(0.5);
        let body = llm.request_body(&[Message::system("s"), Message::user("u")], &[]);
        assert_eq!(body["model"], "phi4");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.5);
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "u"}));
        assert!(body.get("tools").is_none());

        let spec = ToolSpec {
            name: "greet_user".into(),
            description: Some("Greet".into()),
            input_schema: json!({"type": "object"}),
        };
        let body = llm.request_body(&[Message::user("u")], &[spec]);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "greet_user");
    }
}
