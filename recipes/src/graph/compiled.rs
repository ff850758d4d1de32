//! Compiled state graph: immutable, supports invoke only.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. When a
//! checkpointer is set and `config.thread_id` is provided, the final state is
//! saved after invoke.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer, RunnableConfig};

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_node_state,
};
use super::state_graph::END;
use super::{Next, NextEntry, Node};

/// Compiled graph: runs from the entry node, then follows each node's `Next`,
/// its outgoing edge, or its router until END.
///
/// **Interaction**: Every recipe compiles one of these and calls `invoke` once
/// per user request.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) node_order: Vec<String>,
    pub(super) first_node_id: String,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) recursion_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Runs the graph to END and returns the final state.
    ///
    /// Errors: the first node error, `RecursionLimit` when more than
    /// `recursion_limit` node steps run, `ExecutionFailed` when routing names an
    /// unknown node, or a checkpoint error from saving the final state.
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, AgentError> {
        log_graph_start();
        match self.run_loop(state).await {
            Ok((state, steps)) => {
                if let (Some(cp), Some(config)) = (&self.checkpointer, &config) {
                    if config.thread_id.is_some() {
                        let checkpoint =
                            Checkpoint::from_state(state.clone(), CheckpointSource::Update, steps as i64);
                        cp.put(config, &checkpoint).await?;
                    }
                }
                log_graph_complete();
                Ok(state)
            }
            Err(e) => {
                log_graph_error(&e);
                Err(e)
            }
        }
    }

    async fn run_loop(&self, mut state: S) -> Result<(S, usize), AgentError> {
        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;
        loop {
            let node = self.nodes.get(&current_id).ok_or_else(|| {
                AgentError::ExecutionFailed(format!("unknown node: {current_id}"))
            })?;
            steps += 1;
            if steps > self.recursion_limit {
                return Err(AgentError::RecursionLimit(self.recursion_limit));
            }

            log_node_start(&current_id);
            log_node_state(&current_id, &state);
            let (new_state, next) = node.run(state).await?;
            state = new_state;
            log_node_complete(&current_id, &next);

            let next_id = match self.next_map.get(&current_id) {
                Some(NextEntry::Conditional(router)) => router.resolve_next(&state),
                entry => match next {
                    Next::End => END.to_string(),
                    Next::Node(id) => id,
                    Next::Continue => match entry {
                        Some(NextEntry::Unconditional(to)) => to.clone(),
                        _ => END.to_string(),
                    },
                },
            };
            if next_id == END {
                return Ok((state, steps));
            }
            current_id = next_id;
        }
    }

    /// Latest saved state for `config.thread_id`, or `None` when nothing was saved
    /// (or no checkpointer was attached).
    pub async fn get_state(&self, config: &RunnableConfig) -> Result<Option<S>, AgentError> {
        let Some(cp) = &self.checkpointer else {
            return Ok(None);
        };
        Ok(cp.get_tuple(config).await?.map(|(checkpoint, _)| checkpoint.state))
    }

    /// Node ids in the order they were added.
    pub fn node_ids(&self) -> &[String] {
        &self.node_order
    }

    pub fn entry(&self) -> &str {
        &self.first_node_id
    }

    pub(super) fn next_entry(&self, id: &str) -> Option<&NextEntry<S>> {
        self.next_map.get(id)
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }
}
