use async_trait::async_trait;
use serde_json::Value;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

/// A single tool that a model (or a parsed `Action:` reply) can call.
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use recipes::tools::Tool;
/// use recipes::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec {
///             name: "echo".to_string(),
///             description: Some("Repeats the input".to_string()),
///             input_schema: serde_json::json!({"type": "string"}),
///         }
///     }
///
///     async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
///         Ok(ToolCallContent::text(args.to_string()))
///     }
/// }
/// ```
///
/// # Interaction
///
/// - **ToolRegistry**: stores tools by name and dispatches `call(name, args)`.
/// - **ChatOllama::invoke_with_tools**: sends `spec()` as a function definition.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry; what the model writes after `Action: `.
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError>;
}
