//! Conditional edges: route to the next node based on state.
//!
//! A source node has a routing function that takes the current state and
//! returns a key; the key is looked up in an optional path map, and falls back
//! to being used as the next node id.

use std::collections::HashMap;
use std::sync::Arc;

/// Router function: takes a reference to state and returns a routing key.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Conditional edge definition: routing function plus optional path map.
///
/// **Interaction**: Stored by `StateGraph::add_conditional_edges`; resolved by the
/// `CompiledStateGraph` run loop after the source node runs.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S> {
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Next node id (or END): `path_map[key]` if present, otherwise the key itself.
    pub fn resolve_next(&self, state: &S) -> String {
        let key = (self.path)(state);
        self.path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key)
    }

    /// Targets this router may produce, when a path map bounds them.
    pub(super) fn targets(&self) -> Option<Vec<&str>> {
        self.path_map
            .as_ref()
            .map(|m| m.values().map(String::as_str).collect())
    }
}

/// How to determine the next node after a given node runs.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Single fixed next node (or END). The node's own `Next` is still respected.
    Unconditional(String),
    /// Decided by the router from state; the node's `Next` is ignored.
    Conditional(ConditionalRouter<S>),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Key found in path map resolves to the mapped id; a missing key is used as-is.
    #[test]
    fn resolve_next_uses_path_map_then_key() {
        let map: HashMap<String, String> =
            [("done".to_string(), "__end__".to_string())].into_iter().collect();
        let router: ConditionalRouter<i32> = ConditionalRouter::new(
            Arc::new(|n: &i32| if *n > 2 { "done".into() } else { "again".into() }),
            Some(map),
        );
        assert_eq!(router.resolve_next(&3), "__end__");
        assert_eq!(router.resolve_next(&1), "again");
    }
}
