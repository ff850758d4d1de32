//! Checkpoint and metadata types.

use std::time::SystemTime;

/// Where a checkpoint came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckpointSource {
    /// Created from the input of an invoke.
    #[default]
    Input,
    /// Created from inside the run loop.
    Loop,
    /// Created from a state update (the final state of a run).
    Update,
}

impl CheckpointSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Loop => "loop",
            Self::Update => "update",
        }
    }

    /// Unknown strings map to `Update`.
    pub fn parse(s: &str) -> Self {
        match s {
            "input" => Self::Input,
            "loop" => Self::Loop,
            _ => Self::Update,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Node steps taken when the checkpoint was written.
    pub step: i64,
    pub created_at: Option<SystemTime>,
}

/// One saved state snapshot.
///
/// **Interaction**: Produced by `CompiledStateGraph::invoke`; stored by
/// `Checkpointer::put`, returned by `get_tuple`.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub id: String,
    /// RFC 3339 timestamp.
    pub ts: String,
    pub state: S,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// New checkpoint with a fresh id and the current time.
    pub fn from_state(state: S, source: CheckpointSource, step: i64) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), state, source, step)
    }

    pub fn with_id(id: String, state: S, source: CheckpointSource, step: i64) -> Self {
        Self {
            id,
            ts: chrono::Utc::now().to_rfc3339(),
            state,
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: Some(SystemTime::now()),
            },
        }
    }
}

/// Summary row returned by `Checkpointer::list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

/// Applies `after` / `before` / `limit` (keep the newest `limit`) to an oldest-first list.
pub(crate) fn window_list(
    mut items: Vec<CheckpointListItem>,
    limit: Option<usize>,
    before: Option<&str>,
    after: Option<&str>,
) -> Vec<CheckpointListItem> {
    if let Some(a) = after {
        if let Some(pos) = items.iter().position(|i| i.checkpoint_id == a) {
            items.drain(..=pos);
        }
    }
    if let Some(b) = before {
        if let Some(pos) = items.iter().position(|i| i.checkpoint_id == b) {
            items.truncate(pos);
        }
    }
    if let Some(n) = limit {
        let len = items.len();
        if len > n {
            items.drain(..len - n);
        }
    }
    items
}
