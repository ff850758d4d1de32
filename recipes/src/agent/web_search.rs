//! Web-search agent: decide whether to search, fold results into the answer, loop.
//!
//! Graph: `call_agent` → (`incorporate` | `call_agent` | END), `incorporate` →
//! (`call_agent` | END). The iteration count is bumped once per `call_agent`
//! turn. Fresh search results always go through `incorporate` before the
//! iteration cap is checked.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompt::{vars, ChatPromptTemplate};
use crate::tools::ToolRegistry;

use super::parse::{parse_agent_reply, AgentDecision};

pub const NODE_CALL_AGENT: &str = "call_agent";
pub const NODE_INCORPORATE: &str = "incorporate";
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

pub const NO_SEARCH_PREFIX: &str = "No web search needed";
pub const TOOL_RESULT_PREFIX: &str = "Tool Result: ";
pub const UNDETERMINED_MESSAGE: &str = "Error: Could not determine if a tool should be used or not.";

const FORMAT_INSTRUCTIONS: &str = "You must first decide if you need to use a tool. If you decide to use a tool, use this format: \n```\nThought: Do I need to use a tool? Yes\nAction: <tool_name>\nAction Input: <tool_input>\n```\nIf not, use this format: \n```\nThought: Do I need to use a tool? No\nFinal Answer: <your answer>\n```";

const SEARCH_ASSISTANT: &str = "You are a helpful assistant, that has access to internet search results.";

/// Per-run state of the web-search agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchState {
    pub messages: Vec<Message>,
    /// Query just searched, or the current answer.
    pub content: String,
    pub search_results: String,
    pub num_iterations: u32,
}

impl WebSearchState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(question)],
            ..Self::default()
        }
    }

    /// Content of the last message, the recipe's final output.
    pub fn last_message(&self) -> &str {
        self.messages.last().map(Message::content).unwrap_or_default()
    }
}

/// Outcome of one decide-then-act turn.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentTurn {
    /// Assistant message to append to the conversation.
    pub message: String,
    pub decision: AgentDecision,
    /// Tool output when a tool was requested.
    pub tool_result: Option<String>,
}

fn agent_prompt(tools: &ToolRegistry) -> Result<ChatPromptTemplate, AgentError> {
    let mut intro =
        String::from("You are a helpful assistant, that can use tools. You have access to the following tool:");
    for line in tools.describe().lines() {
        intro.push_str("\n ");
        intro.push_str(line);
    }
    let intro = intro.replace('{', "{{").replace('}', "}}");
    Ok(ChatPromptTemplate::new()
        .with_message("system", &intro)?
        .with_placeholder("messages")
        .with_message("system", FORMAT_INSTRUCTIONS)?)
}

/// Asks the model whether a tool is needed and runs the tool when it is.
///
/// An unknown tool yields `Error: Tool '<name>' not found.` and a failing tool
/// `Error: <err>`; both are reported as that turn's tool result.
pub async fn decide_and_act(
    llm: &dyn LlmClient,
    tools: &ToolRegistry,
    messages: &[Message],
) -> Result<AgentTurn, AgentError> {
    let placeholders = HashMap::from([("messages".to_string(), messages.to_vec())]);
    let prompt = agent_prompt(tools)?.format(&HashMap::new(), &placeholders)?;
    let reply = llm.invoke(&prompt).await?;
    let decision = parse_agent_reply(&reply.content);
    let turn = match &decision {
        AgentDecision::UseTool { tool, input } => {
            let result = if tools.get(tool).is_none() {
                format!("Error: Tool '{tool}' not found.")
            } else {
                match tools.call(tool, Value::String(input.clone())).await {
                    Ok(out) => out.text,
                    Err(e) => {
                        tracing::warn!(tool = %tool, error = %e, "tool call failed");
                        format!("Error: {e}")
                    }
                }
            };
            tracing::debug!(tool = %tool, input = %input, "tool turn");
            AgentTurn {
                message: format!("{TOOL_RESULT_PREFIX}{result}"),
                tool_result: Some(result),
                decision,
            }
        }
        AgentDecision::FinalAnswer(answer) => AgentTurn {
            message: format!("{NO_SEARCH_PREFIX}: {answer}"),
            tool_result: None,
            decision,
        },
        AgentDecision::Undetermined => AgentTurn {
            message: UNDETERMINED_MESSAGE.to_string(),
            tool_result: None,
            decision,
        },
    };
    Ok(turn)
}

/// Asks the model to refine `content` with `search_results`.
pub async fn refine_with_results(
    llm: &dyn LlmClient,
    request: &str,
    content: &str,
    search_results: &str,
) -> Result<String, AgentError> {
    let prompt = ChatPromptTemplate::from_messages([
        ("system", SEARCH_ASSISTANT),
        ("human", request),
    ])?
    .format_messages(&vars([
        ("content", content),
        ("search_results", search_results),
    ]))?;
    Ok(llm.invoke(&prompt).await?.content)
}

/// `call_agent`: one decide-then-act turn.
pub struct CallAgentNode {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

impl CallAgentNode {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self { llm, tools }
    }
}

#[async_trait]
impl Node<WebSearchState> for CallAgentNode {
    fn id(&self) -> &str {
        NODE_CALL_AGENT
    }

    async fn run(&self, state: WebSearchState) -> Result<(WebSearchState, Next), AgentError> {
        let turn = decide_and_act(self.llm.as_ref(), &self.tools, &state.messages).await?;
        let WebSearchState {
            mut messages,
            num_iterations,
            ..
        } = state;
        messages.push(Message::assistant(turn.message.clone()));
        let (content, search_results) = match turn.decision {
            AgentDecision::UseTool { input, .. } => (input, turn.tool_result.unwrap_or_default()),
            AgentDecision::FinalAnswer(answer) => (answer, String::new()),
            AgentDecision::Undetermined => (turn.message, String::new()),
        };
        Ok((
            WebSearchState {
                messages,
                content,
                search_results,
                num_iterations: num_iterations + 1,
            },
            Next::Continue,
        ))
    }
}

/// `incorporate`: refine the content with the latest search results.
pub struct IncorporateNode {
    llm: Arc<dyn LlmClient>,
}

impl IncorporateNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

const REFINE_INFORMATION: &str = "Refine the following information based on the web search results provided.  Here is the original information/question: {content}. \n\nHere are the web search results: {search_results}";

#[async_trait]
impl Node<WebSearchState> for IncorporateNode {
    fn id(&self) -> &str {
        NODE_INCORPORATE
    }

    async fn run(&self, mut state: WebSearchState) -> Result<(WebSearchState, Next), AgentError> {
        if state.last_message().contains(NO_SEARCH_PREFIX) {
            return Ok((state, Next::Continue));
        }
        let refined = refine_with_results(
            self.llm.as_ref(),
            REFINE_INFORMATION,
            &state.content,
            &state.search_results,
        )
        .await?;
        state.messages.push(Message::assistant(refined.clone()));
        state.content = refined;
        state.search_results.clear();
        Ok((state, Next::Continue))
    }
}

/// After `call_agent`: END once answered, `incorporate` when results arrived,
/// END past the iteration cap, otherwise ask again.
pub fn route_after_agent(state: &WebSearchState, max_iterations: u32) -> String {
    if state.last_message().contains(NO_SEARCH_PREFIX) {
        END.to_string()
    } else if !state.search_results.is_empty() {
        NODE_INCORPORATE.to_string()
    } else if state.num_iterations > max_iterations {
        END.to_string()
    } else {
        NODE_CALL_AGENT.to_string()
    }
}

/// After `incorporate`: END past the iteration cap, otherwise `call_agent`.
pub fn route_after_incorporate(state: &WebSearchState, max_iterations: u32) -> String {
    if state.num_iterations > max_iterations {
        END.to_string()
    } else {
        NODE_CALL_AGENT.to_string()
    }
}

pub(super) fn path_map(targets: &[&str]) -> HashMap<String, String> {
    targets
        .iter()
        .map(|t| (t.to_string(), t.to_string()))
        .collect()
}

/// Builds the web-search agent graph.
pub fn build_web_search_graph(
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_iterations: u32,
) -> Result<CompiledStateGraph<WebSearchState>, CompilationError> {
    let mut graph = StateGraph::<WebSearchState>::new();
    graph
        .add_node(NODE_CALL_AGENT, Arc::new(CallAgentNode::new(llm.clone(), tools)))
        .add_node(NODE_INCORPORATE, Arc::new(IncorporateNode::new(llm)))
        .set_entry_point(NODE_CALL_AGENT)
        .add_conditional_edges(
            NODE_CALL_AGENT,
            Arc::new(move |s: &WebSearchState| route_after_agent(s, max_iterations)),
            Some(path_map(&[NODE_INCORPORATE, NODE_CALL_AGENT, END])),
        )
        .add_conditional_edges(
            NODE_INCORPORATE,
            Arc::new(move |s: &WebSearchState| route_after_incorporate(s, max_iterations)),
            Some(path_map(&[NODE_CALL_AGENT, END])),
        );
    graph.compile()
}

/// Runs the agent on `question` and returns the last message.
pub async fn run_web_search(
    graph: &CompiledStateGraph<WebSearchState>,
    question: &str,
) -> Result<String, AgentError> {
    tracing::info!(question, "web search agent start");
    let out = graph.invoke(WebSearchState::new(question), None).await?;
    tracing::info!(iterations = out.num_iterations, "web search agent done");
    Ok(out.last_message().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(last: &str, results: &str, n: u32) -> WebSearchState {
        WebSearchState {
            messages: vec![Message::user("q"), Message::assistant(last)],
            content: String::new(),
            search_results: results.into(),
            num_iterations: n,
        }
    }

    #[test]
    fn route_after_agent_cases() {
        assert_eq!(route_after_agent(&state("No web search needed: 4", "", 1), 3), END);
        assert_eq!(route_after_agent(&state("Tool Result: x", "x", 1), 3), NODE_INCORPORATE);
        assert_eq!(route_after_agent(&state(UNDETERMINED_MESSAGE, "", 1), 3), NODE_CALL_AGENT);
        assert_eq!(route_after_agent(&state(UNDETERMINED_MESSAGE, "", 4), 3), END);
        assert_eq!(route_after_agent(&state("Tool Result: x", "x", 4), 3), NODE_INCORPORATE);
    }

    #[test]
    fn route_after_incorporate_stops_past_cap() {
        assert_eq!(route_after_incorporate(&state("r", "", 3), 3), NODE_CALL_AGENT);
        assert_eq!(route_after_incorporate(&state("r", "", 4), 3), END);
    }

    #[test]
    fn prompt_lists_tools_between_system_messages() {
        let prompt = agent_prompt(&ToolRegistry::new()).unwrap();
        let placeholders = HashMap::from([("messages".to_string(), vec![Message::user("hi")])]);
        let out = prompt.format(&HashMap::new(), &placeholders).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], Message::user("hi"));
        assert!(out[2].content().contains("Action Input: <tool_input>"));
    }
}
