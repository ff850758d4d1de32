//! Graph node trait: one step in a StateGraph.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::Next;

/// One step in a graph: state in, (state out, next step).
///
/// **Interaction**: Registered with `StateGraph::add_node`; run by
/// `CompiledStateGraph::invoke`. Recipe nodes (`call_agent`, `fact_check`,
/// `printer`, ...) implement this directly or through [`FnNode`](super::FnNode).
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"call_agent"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step. Return `Next::Continue` to follow the graph's edges.
    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;
}
