//! Tool surface types shared by tools, the registry and LLM clients.
//!
//! `ToolSpec` is what a model sees (name, description, JSON schema);
//! `ToolCallContent` is what a tool returns.

use serde_json::Value;
use thiserror::Error;

/// Tool specification handed to tool-calling models.
///
/// **Interaction**: Returned by `Tool::spec()` and `ToolRegistry::list()`;
/// sent by `ChatOllama::invoke_with_tools` as `tools[].function`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema for arguments.
    pub input_schema: Value,
}

/// Result text of a single tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallContent {
    pub text: String,
}

impl ToolCallContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    /// HTTP failure or non-2xx status from the remote service.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered but the tool could not produce a result.
    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// Extracts the single string argument of a string-input tool.
///
/// Accepts a bare JSON string or an object with `key` (e.g. `{"query": "..."}`).
pub fn string_arg(args: &Value, key: &str) -> Result<String, ToolSourceError> {
    match args {
        Value::String(s) => Ok(s.clone()),
        Value::Object(map) => match map.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(ToolSourceError::InvalidInput(format!("missing {key}"))),
        },
        other => Err(ToolSourceError::InvalidInput(format!(
            "expected a string or an object with {key}, got {other}"
        ))),
    }
}
