//! Name → tool map with ordered listing.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

/// Tools by name, listed in registration order.
///
/// **Interaction**: Shared by the web-search node (`Action:` dispatch), the
/// GitHub agent, and `ToolCallingAgent` (native tool calls).
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool; a tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.name().to_string();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
        self
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn list(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|n| self.tools.get(n))
            .map(|t| t.spec())
            .collect()
    }

    /// One `name: description` line per tool, for text prompts.
    pub fn describe(&self) -> String {
        self.list()
            .into_iter()
            .map(|s| format!("{}: {}", s.name, s.description.unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))?;
        tracing::debug!(tool = name, "calling tool");
        tool.call(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.0.into(),
                description: Some(format!("{} tool", self.0)),
                input_schema: json!({}),
            }
        }

        async fn call(&self, _args: Value) -> Result<ToolCallContent, ToolSourceError> {
            Ok(ToolCallContent::text(self.0))
        }
    }

    /// **Scenario**: list keeps registration order; describe renders one line per tool.
    #[test]
    fn list_in_registration_order() {
        let reg = ToolRegistry::new()
            .with(Arc::new(Named("b")))
            .with(Arc::new(Named("a")));
        let names: Vec<_> = reg.list().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(reg.describe(), "b: b tool\na: a tool");
    }

    /// **Scenario**: Unknown names return NotFound; known names dispatch.
    #[tokio::test]
    async fn call_dispatches_or_not_found() {
        let reg = ToolRegistry::new().with(Arc::new(Named("a")));
        assert_eq!(reg.call("a", json!(null)).await.unwrap().text, "a");
        assert!(matches!(
            reg.call("zzz", json!(null)).await,
            Err(ToolSourceError::NotFound(n)) if n == "zzz"
        ));
    }
}
