//! Agent error type shared by nodes, LLM clients and graph execution.

use thiserror::Error;

use crate::memory::CheckpointError;
use crate::prompt::PromptError;
use crate::tool_source::ToolSourceError;

/// Error returned by [`Node::run`](crate::graph::Node::run), [`LlmClient`](crate::llm::LlmClient)
/// and [`CompiledStateGraph::invoke`](crate::graph::CompiledStateGraph::invoke).
///
/// **Interaction**: Recipes surface this to the CLI, which prints it and exits
/// with status 1. There is no retry layer above it.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A node or router failed (bad routing key, unexpected state).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The model server returned an error or an unreadable reply.
    #[error("llm: {0}")]
    Llm(String),

    /// The run took more node steps than the graph's recursion limit.
    #[error("recursion limit of {0} reached without hitting END")]
    RecursionLimit(usize),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Tool(#[from] ToolSourceError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of RecursionLimit names the limit.
    #[test]
    fn recursion_limit_display_contains_limit() {
        let s = AgentError::RecursionLimit(25).to_string();
        assert!(s.contains("25"), "{}", s);
        assert!(s.contains("recursion limit"), "{}", s);
    }

    /// **Scenario**: Tool errors convert through `?` and keep their message.
    #[test]
    fn tool_error_converts_transparently() {
        let err: AgentError = ToolSourceError::NotFound("web_search_tool".into()).into();
        assert!(err.to_string().contains("web_search_tool"));
    }
}
