//! Generate / fact-check loops, with an optional web-research detour.
//!
//! Basic: `generate` → `fact_check` → (END | `generate`).
//! Research: `generate` → `call_agent` → (`fact_check` | `incorporate`),
//! `incorporate` → `generate`, `fact_check` → (END | `generate`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::ToolRegistry;

use super::web_search::{
    decide_and_act, path_map, refine_with_results, NODE_CALL_AGENT, NODE_INCORPORATE,
    NO_SEARCH_PREFIX,
};

pub const NODE_GENERATE: &str = "generate";
pub const NODE_FACT_CHECK: &str = "fact_check";
pub const DEFAULT_REVIEW_ITERATIONS: u32 = 3;

const REFINE_CONTENT: &str = "Refine the following content based on the web search results provided.  Here is the original content: {content}. \n\nHere are the web search results: {search_results}";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub messages: Vec<Message>,
    pub content: String,
    /// Lower-cased fact-check verdict.
    pub assessment: String,
    pub num_iterations: u32,
    pub search_results: String,
}

impl ReviewState {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(request)],
            ..Self::default()
        }
    }
}

/// True when the verdict calls the content accurate. "inaccurate" and a
/// qualifier right before the word ("not accurate", "mostly accurate") do not count.
pub fn is_judged_accurate(assessment: &str) -> bool {
    let words: Vec<String> = assessment
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    words.iter().enumerate().any(|(i, w)| {
        w == "accurate"
            && !matches!(
                i.checked_sub(1).map(|p| words[p].as_str()),
                Some("not" | "isn't" | "never" | "partially" | "mostly" | "largely")
            )
    })
}

/// `generate`: model on the conversation; the reply becomes the content.
pub struct GenerateNode {
    llm: Arc<dyn LlmClient>,
}

impl GenerateNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<ReviewState> for GenerateNode {
    fn id(&self) -> &str {
        NODE_GENERATE
    }

    async fn run(&self, mut state: ReviewState) -> Result<(ReviewState, Next), AgentError> {
        let reply = self.llm.invoke(&state.messages).await?;
        state.messages.push(Message::assistant(reply.content.clone()));
        state.content = reply.content;
        state.num_iterations += 1;
        tracing::debug!(iteration = state.num_iterations, "generated draft");
        Ok((state, Next::Continue))
    }
}

/// `fact_check`: ask for an accuracy verdict on the content.
pub struct FactCheckNode {
    llm: Arc<dyn LlmClient>,
}

impl FactCheckNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<ReviewState> for FactCheckNode {
    fn id(&self) -> &str {
        NODE_FACT_CHECK
    }

    async fn run(&self, mut state: ReviewState) -> Result<(ReviewState, Next), AgentError> {
        let prompt = [Message::user(format!("Assess accuracy: {}", state.content))];
        let reply = self.llm.invoke(&prompt).await?;
        state.assessment = reply.content.trim().to_lowercase();
        Ok((state, Next::Continue))
    }
}

/// Research `call_agent`: decide whether the draft needs a web search.
pub struct ResearchAgentNode {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
}

impl ResearchAgentNode {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self { llm, tools }
    }
}

#[async_trait]
impl Node<ReviewState> for ResearchAgentNode {
    fn id(&self) -> &str {
        NODE_CALL_AGENT
    }

    async fn run(&self, mut state: ReviewState) -> Result<(ReviewState, Next), AgentError> {
        let turn = decide_and_act(self.llm.as_ref(), &self.tools, &state.messages).await?;
        state.search_results = turn.tool_result.unwrap_or_default();
        state.messages.push(Message::assistant(turn.message));
        Ok((state, Next::Continue))
    }
}

/// Research `incorporate`: refine the draft with the last tool message.
pub struct ResearchIncorporateNode {
    llm: Arc<dyn LlmClient>,
}

impl ResearchIncorporateNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Node<ReviewState> for ResearchIncorporateNode {
    fn id(&self) -> &str {
        NODE_INCORPORATE
    }

    async fn run(&self, mut state: ReviewState) -> Result<(ReviewState, Next), AgentError> {
        let last = state
            .messages
            .last()
            .map(|m| m.content().to_string())
            .unwrap_or_default();
        if last.contains(NO_SEARCH_PREFIX) {
            return Ok((state, Next::Continue));
        }
        let refined =
            refine_with_results(self.llm.as_ref(), REFINE_CONTENT, &state.content, &last).await?;
        state.messages.push(Message::assistant(refined.clone()));
        state.content = refined;
        state.search_results.clear();
        Ok((state, Next::Continue))
    }
}

/// After `fact_check`: END when judged accurate or the cap is reached.
pub fn route_after_fact_check(state: &ReviewState, max_iterations: u32) -> String {
    if is_judged_accurate(&state.assessment) || state.num_iterations >= max_iterations {
        END.to_string()
    } else {
        NODE_GENERATE.to_string()
    }
}

/// After research `call_agent`: fact-check when no search was needed.
pub fn route_after_research(state: &ReviewState) -> String {
    let answered = state
        .messages
        .last()
        .is_some_and(|m| m.content().contains(NO_SEARCH_PREFIX));
    if answered {
        NODE_FACT_CHECK.to_string()
    } else {
        NODE_INCORPORATE.to_string()
    }
}

/// Builds the generate / fact-check loop.
pub fn build_review_graph(
    generator: Arc<dyn LlmClient>,
    fact_checker: Arc<dyn LlmClient>,
    max_iterations: u32,
) -> Result<CompiledStateGraph<ReviewState>, CompilationError> {
    let mut graph = StateGraph::<ReviewState>::new();
    graph
        .add_node(NODE_GENERATE, Arc::new(GenerateNode::new(generator)))
        .add_node(NODE_FACT_CHECK, Arc::new(FactCheckNode::new(fact_checker)))
        .set_entry_point(NODE_GENERATE)
        .add_edge(NODE_GENERATE, NODE_FACT_CHECK)
        .add_conditional_edges(
            NODE_FACT_CHECK,
            Arc::new(move |s: &ReviewState| route_after_fact_check(s, max_iterations)),
            Some(path_map(&[NODE_GENERATE, END])),
        );
    graph.compile()
}

/// Builds the loop with a web-research step between drafting and fact-checking.
pub fn build_research_review_graph(
    generator: Arc<dyn LlmClient>,
    fact_checker: Arc<dyn LlmClient>,
    agent: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_iterations: u32,
) -> Result<CompiledStateGraph<ReviewState>, CompilationError> {
    let mut graph = StateGraph::<ReviewState>::new();
    graph
        .add_node(NODE_GENERATE, Arc::new(GenerateNode::new(generator.clone())))
        .add_node(NODE_FACT_CHECK, Arc::new(FactCheckNode::new(fact_checker)))
        .add_node(NODE_CALL_AGENT, Arc::new(ResearchAgentNode::new(agent, tools)))
        .add_node(NODE_INCORPORATE, Arc::new(ResearchIncorporateNode::new(generator)))
        .set_entry_point(NODE_GENERATE)
        .add_edge(NODE_GENERATE, NODE_CALL_AGENT)
        .add_edge(NODE_INCORPORATE, NODE_GENERATE)
        .add_conditional_edges(
            NODE_CALL_AGENT,
            Arc::new(route_after_research),
            Some(path_map(&[NODE_INCORPORATE, NODE_FACT_CHECK])),
        )
        .add_conditional_edges(
            NODE_FACT_CHECK,
            Arc::new(move |s: &ReviewState| route_after_fact_check(s, max_iterations)),
            Some(path_map(&[NODE_GENERATE, END])),
        );
    graph.compile()
}

/// Runs a review graph and returns the final content.
pub async fn run_review(
    graph: &CompiledStateGraph<ReviewState>,
    request: &str,
) -> Result<String, AgentError> {
    tracing::info!("review loop start");
    let out = graph.invoke(ReviewState::new(request), None).await?;
    tracing::info!(iterations = out.num_iterations, assessment = %out.assessment, "review loop done");
    Ok(out.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_verdict_is_word_aware() {
        assert!(is_judged_accurate("the content is accurate."));
        assert!(is_judged_accurate("Accurate"));
        assert!(!is_judged_accurate("the post is inaccurate in places"));
        assert!(!is_judged_accurate("this is not accurate"));
        assert!(!is_judged_accurate("mostly accurate, but the dates are wrong"));
        assert!(!is_judged_accurate(""));
    }

    #[test]
    fn fact_check_router_respects_cap() {
        let mut s = ReviewState {
            assessment: "inaccurate".into(),
            num_iterations: 1,
            ..ReviewState::default()
        };
        assert_eq!(route_after_fact_check(&s, 3), NODE_GENERATE);
        s.num_iterations = 3;
        assert_eq!(route_after_fact_check(&s, 3), END);
        s.num_iterations = 1;
        s.assessment = "accurate".into();
        assert_eq!(route_after_fact_check(&s, 3), END);
    }

    #[test]
    fn research_router_goes_to_fact_check_when_answered() {
        let mut s = ReviewState::new("q");
        s.messages.push(Message::assistant("No web search needed: fine"));
        assert_eq!(route_after_research(&s), NODE_FACT_CHECK);
        s.messages.push(Message::assistant("Tool Result: x"));
        assert_eq!(route_after_research(&s), NODE_INCORPORATE);
    }
}
