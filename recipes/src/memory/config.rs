//! Invoke config: which thread (and optionally which checkpoint) a run belongs to.

/// Config for a single invoke. When using a checkpointer, `thread_id` is required.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(state, config)` and
/// `Checkpointer::put` / `get_tuple` / `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnableConfig {
    pub thread_id: Option<String>,
    /// Load this checkpoint instead of the latest.
    pub checkpoint_id: Option<String>,
    /// Namespace for checkpoints; empty by default.
    pub checkpoint_ns: String,
}

impl RunnableConfig {
    /// Config for `thread_id` with the default namespace.
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: for_thread sets only the thread id.
    #[test]
    fn for_thread_sets_thread_id() {
        let c = RunnableConfig::for_thread("1");
        assert_eq!(c.thread_id.as_deref(), Some("1"));
        assert!(c.checkpoint_id.is_none());
        assert!(c.checkpoint_ns.is_empty());
    }
}
