//! GitHub agent: the model names a tool in free text, a keyword matcher runs it.
//!
//! Graph: `call_llm` → (`call_tool` | END), `call_tool` → `call_llm`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::github::{
    TOOL_FILES_OVERVIEW, TOOL_LIST_REPOSITORIES, TOOL_READ_FILE, TOOL_SEARCH_ISSUES,
};
use crate::tools::ToolRegistry;

use super::web_search::path_map;

pub const NODE_CALL_LLM: &str = "call_llm";
pub const NODE_CALL_TOOL: &str = "call_tool";
pub const DEFAULT_MAX_STEPS: u32 = 5;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubAgentState {
    pub messages: Vec<Message>,
    /// Last model reply, naming the action to take.
    pub next: String,
    pub repository: String,
    /// `call_llm` turns so far.
    pub steps: u32,
}

impl GitHubAgentState {
    /// Starts with the file-overview request for `repository`.
    pub fn overview(repository: impl Into<String>) -> Self {
        let repository = repository.into();
        Self {
            messages: vec![Message::user(format!(
                "Overview of existing files in Main branch of {repository} repository."
            ))],
            repository,
            ..Self::default()
        }
    }
}

/// Picks the tool for `next` and its input.
///
/// A registered tool name in the text wins and is removed from the input;
/// otherwise keywords map to a tool and the whole text is its input.
pub fn select_tool(next: &str, tools: &ToolRegistry) -> Option<(String, String)> {
    if next.trim().is_empty() {
        return None;
    }
    if let Some(name) = tools.names().iter().find(|n| next.contains(n.as_str())) {
        return Some((name.clone(), next.replace(name.as_str(), "").trim().to_string()));
    }
    let lower = next.to_lowercase();
    let keyword_tool = if lower.contains("issues") {
        TOOL_SEARCH_ISSUES
    } else if lower.contains("repositories") || lower.contains("repos") {
        TOOL_LIST_REPOSITORIES
    } else if lower.contains("content") {
        TOOL_READ_FILE
    } else if lower.contains("files") || lower.contains("overview") {
        TOOL_FILES_OVERVIEW
    } else {
        return None;
    };
    tools
        .get(keyword_tool)
        .map(|_| (keyword_tool.to_string(), next.trim().to_string()))
}

fn tool_menu(tools: &ToolRegistry, repository: &str) -> String {
    format!(
        "You are working with the GitHub repository {repository}. You can use these tools:\n{}\nReply with the name of the tool to use followed by its input, if any.",
        tools.describe()
    )
}

/// `call_llm`: ask the model for the next action.
pub struct CallLlmNode {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

impl CallLlmNode {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self { llm, tools }
    }
}

#[async_trait]
impl Node<GitHubAgentState> for CallLlmNode {
    fn id(&self) -> &str {
        NODE_CALL_LLM
    }

    async fn run(&self, mut state: GitHubAgentState) -> Result<(GitHubAgentState, Next), AgentError> {
        let mut prompt = vec![Message::system(tool_menu(&self.tools, &state.repository))];
        prompt.extend(state.messages.iter().cloned());
        let reply = self.llm.invoke(&prompt).await?;
        state.next = reply.content;
        state.steps += 1;
        tracing::debug!(step = state.steps, next = %state.next, "github agent decided");
        Ok((state, Next::Continue))
    }
}

/// `call_tool`: run the selected tool, append `result: <text>`, clear `next`.
pub struct CallToolNode {
    tools: ToolRegistry,
}

impl CallToolNode {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Node<GitHubAgentState> for CallToolNode {
    fn id(&self) -> &str {
        NODE_CALL_TOOL
    }

    async fn run(&self, mut state: GitHubAgentState) -> Result<(GitHubAgentState, Next), AgentError> {
        let result = match select_tool(&state.next, &self.tools) {
            Some((name, input)) => match self.tools.call(&name, Value::String(input)).await {
                Ok(out) => out.text,
                Err(e) => {
                    tracing::warn!(tool = %name, error = %e, "github tool failed");
                    format!("Error: {e}")
                }
            },
            None => String::new(),
        };
        state.messages.push(Message::user(format!("result: {result}")));
        state.next.clear();
        Ok((state, Next::Continue))
    }
}

/// After `call_llm`: run a tool when one is selectable and steps remain.
pub fn route_after_llm(state: &GitHubAgentState, tools: &ToolRegistry, max_steps: u32) -> String {
    if state.steps >= max_steps || select_tool(&state.next, tools).is_none() {
        END.to_string()
    } else {
        NODE_CALL_TOOL.to_string()
    }
}

pub fn build_github_graph(
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_steps: u32,
) -> Result<CompiledStateGraph<GitHubAgentState>, CompilationError> {
    let router_tools = tools.clone();
    let mut graph = StateGraph::<GitHubAgentState>::new();
    graph
        .add_node(NODE_CALL_LLM, Arc::new(CallLlmNode::new(llm, tools.clone())))
        .add_node(NODE_CALL_TOOL, Arc::new(CallToolNode::new(tools)))
        .set_entry_point(NODE_CALL_LLM)
        .add_edge(NODE_CALL_TOOL, NODE_CALL_LLM)
        .add_conditional_edges(
            NODE_CALL_LLM,
            Arc::new(move |s: &GitHubAgentState| route_after_llm(s, &router_tools, max_steps)),
            Some(path_map(&[NODE_CALL_TOOL, END])),
        );
    graph.compile()
}
