//! Native tool calling: think (model with tool specs) → act (run the calls) → repeat.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END};
use crate::llm::{LlmClient, ToolCall};
use crate::message::Message;
use crate::tool_source::ToolSourceError;
use crate::tools::ToolRegistry;

use super::web_search::path_map;

pub const NODE_THINK: &str = "think";
pub const NODE_ACT: &str = "act";
pub const DEFAULT_TOOL_STEPS: u32 = 5;

/// Output of one tool call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolResult {
    pub name: String,
    pub text: String,
}

/// Runs every call in order. Unknown names and failures become result text.
pub async fn dispatch_tool_calls(tools: &ToolRegistry, calls: &[ToolCall]) -> Vec<ToolResult> {
    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        let text = match tools.call(&call.name, call.arguments.clone()).await {
            Ok(out) => out.text,
            Err(ToolSourceError::NotFound(name)) => {
                format!("Tool '{name}' not found in the tools dictionary.")
            }
            Err(e) => format!("Error: {e}"),
        };
        results.push(ToolResult {
            name: call.name.clone(),
            text,
        });
    }
    results
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolCallingState {
    pub messages: Vec<Message>,
    /// Calls requested by the latest think step.
    pub tool_calls: Vec<ToolCall>,
    /// Every call made so far, in order.
    pub calls_made: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    pub turn_count: u32,
}

/// `think`: model with the registry's tool specs.
pub struct ThinkNode {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

impl ThinkNode {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self { llm, tools }
    }
}

#[async_trait]
impl Node<ToolCallingState> for ThinkNode {
    fn id(&self) -> &str {
        NODE_THINK
    }

    async fn run(&self, mut state: ToolCallingState) -> Result<(ToolCallingState, Next), AgentError> {
        let response = self
            .llm
            .invoke_with_tools(&state.messages, &self.tools.list())
            .await?;
        state.messages.push(Message::assistant(response.content));
        state.tool_calls = response.tool_calls;
        state.turn_count += 1;
        Ok((state, Next::Continue))
    }
}

/// `act`: run the pending calls and feed results back as user messages.
pub struct ActNode {
    tools: ToolRegistry,
}

impl ActNode {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Node<ToolCallingState> for ActNode {
    fn id(&self) -> &str {
        NODE_ACT
    }

    async fn run(&self, mut state: ToolCallingState) -> Result<(ToolCallingState, Next), AgentError> {
        let calls = std::mem::take(&mut state.tool_calls);
        let results = dispatch_tool_calls(&self.tools, &calls).await;
        for r in &results {
            state
                .messages
                .push(Message::user(format!("Tool {} returned: {}", r.name, r.text)));
        }
        state.calls_made.extend(calls);
        state.tool_results.extend(results);
        Ok((state, Next::Continue))
    }
}

/// Final answer plus the trail of calls and results.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallingOutcome {
    pub answer: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
}

/// Think/act loop over a tool registry.
///
/// **Interaction**: The `github --structured` subcommand runs it over the GitHub toolkit.
pub struct ToolCallingAgent {
    graph: CompiledStateGraph<ToolCallingState>,
    system_prompt: Option<String>,
}

impl ToolCallingAgent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        max_steps: u32,
    ) -> Result<Self, CompilationError> {
        let mut graph = StateGraph::<ToolCallingState>::new();
        graph
            .add_node(NODE_THINK, Arc::new(ThinkNode::new(llm, tools.clone())))
            .add_node(NODE_ACT, Arc::new(ActNode::new(tools)))
            .set_entry_point(NODE_THINK)
            .add_edge(NODE_ACT, NODE_THINK)
            .add_conditional_edges(
                NODE_THINK,
                Arc::new(move |s: &ToolCallingState| {
                    if s.tool_calls.is_empty() || s.turn_count >= max_steps {
                        END.to_string()
                    } else {
                        NODE_ACT.to_string()
                    }
                }),
                Some(path_map(&[NODE_ACT, END])),
            );
        Ok(Self {
            graph: graph.compile()?,
            system_prompt: None,
        })
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub async fn run(&self, input: &str) -> Result<ToolCallingOutcome, AgentError> {
        let mut messages = Vec::new();
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(input));
        let state = ToolCallingState {
            messages,
            ..ToolCallingState::default()
        };
        let out = self.graph.invoke(state, None).await?;
        let answer = out
            .messages
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::Assistant(text) => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default();
        Ok(ToolCallingOutcome {
            answer,
            tool_calls: out.calls_made,
            tool_results: out.tool_results,
        })
    }
}

/// Arguments rendered compactly for display.
pub fn format_arguments(args: &Value) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| args.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::tools::{GreetUserTool, ValidateUserTool};
    use serde_json::json;

    fn demo_tools() -> ToolRegistry {
        ToolRegistry::new()
            .with(Arc::new(ValidateUserTool))
            .with(Arc::new(GreetUserTool))
    }

    #[tokio::test]
    async fn dispatch_reports_unknown_tools() {
        let calls = vec![
            ToolCall::new("greet_user", json!({"name": "Ada"})),
            ToolCall::new("delete_user", json!({})),
        ];
        let results = dispatch_tool_calls(&demo_tools(), &calls).await;
        assert_eq!(results[0].text, "Hello, Ada!");
        assert_eq!(
            results[1].text,
            "Tool 'delete_user' not found in the tools dictionary."
        );
    }

    /// **Scenario**: One round of tool calls, then a plain answer ends the loop.
    #[tokio::test]
    async fn agent_runs_calls_then_answers() {
        let llm = Arc::new(MockLlm::tool_calls_then(
            vec![ToolCall::new(
                "validate_user",
                json!({"user_id": 123, "addresses": ["123 Fake St"]}),
            )],
            "User 123 is valid.",
        ));
        let agent = ToolCallingAgent::new(llm.clone(), demo_tools(), DEFAULT_TOOL_STEPS).unwrap();
        let out = agent.run("Could you validate user 123?").await.unwrap();
        assert_eq!(out.answer, "User 123 is valid.");
        assert_eq!(out.tool_calls.len(), 1);
        assert_eq!(out.tool_results[0].text, "true");
        assert_eq!(llm.call_count(), 2);
    }

    /// **Scenario**: A model that keeps calling tools is cut off at the step cap.
    #[tokio::test]
    async fn agent_stops_at_step_cap() {
        let call = ToolCall::new("greet_user", json!({"name": "Bo"}));
        let reply = crate::llm::LlmResponse {
            content: String::new(),
            tool_calls: vec![call],
            usage: None,
        };
        let llm = Arc::new(MockLlm::new(vec![reply]));
        let agent = ToolCallingAgent::new(llm.clone(), demo_tools(), 2).unwrap();
        let out = agent.run("hi").await.unwrap();
        assert_eq!(llm.call_count(), 2);
        assert_eq!(out.tool_results.len(), 1);
    }

    #[test]
    fn format_arguments_is_compact_json() {
        assert_eq!(format_arguments(&json!({"name": "Ada"})), r#"{"name":"Ada"}"#);
    }
}
