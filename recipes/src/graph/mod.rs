//! Minimal state-graph runtime: nodes, edges, conditional routing, checkpoints.
//!
//! Build a [`StateGraph`], `compile` it, then `invoke` with an initial state.

mod compile_error;
mod compiled;
mod conditional;
mod fn_node;
mod logging;
mod next;
mod node;
mod state_graph;
mod visualization;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use fn_node::FnNode;
pub use next::Next;
pub use node::Node;
pub use state_graph::{StateGraph, DEFAULT_RECURSION_LIMIT, END, START};
pub use visualization::generate_mermaid;
