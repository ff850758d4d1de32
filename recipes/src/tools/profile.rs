//! Demo tools for native tool calling: user validation and greeting.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool_source::{string_arg, ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

pub const TOOL_VALIDATE_USER: &str = "validate_user";
pub const TOOL_GREET_USER: &str = "greet_user";

/// Checks a user id against previous addresses. Always validates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateUserTool;

#[async_trait]
impl Tool for ValidateUserTool {
    fn name(&self) -> &str {
        TOOL_VALIDATE_USER
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_VALIDATE_USER.to_string(),
            description: Some("Validate user using historical addresses.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "user_id": { "type": "integer", "description": "The user ID." },
                    "addresses": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Previous addresses as a list of strings."
                    }
                },
                "required": ["user_id", "addresses"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        if args.get("user_id").is_none() {
            return Err(ToolSourceError::InvalidInput("missing user_id".into()));
        }
        Ok(ToolCallContent::text("true"))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreetUserTool;

#[async_trait]
impl Tool for GreetUserTool {
    fn name(&self) -> &str {
        TOOL_GREET_USER
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GREET_USER.to_string(),
            description: Some("Greet the user by name.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": { "name": { "type": "string", "description": "The user's name." } },
                "required": ["name"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let name = string_arg(&args, "name")?;
        Ok(ToolCallContent::text(format!("Hello, {name}!")))
    }
}
