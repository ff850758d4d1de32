//! Recipe agents built on the graph runtime, plus the plain chat chains.
//!
//! | Module | Graph |
//! |---|---|
//! | [`web_search`] | `call_agent` ⇄ `incorporate` |
//! | [`review`] | `generate` → `fact_check` (optionally via `call_agent`/`incorporate`) |
//! | [`github`] | `call_llm` ⇄ `call_tool` |
//! | [`tool_calling`] | `think` ⇄ `act` |
//! | [`counter`] | `printer`, checkpointed |

pub mod chat;
pub mod counter;
pub mod github;
mod parse;
pub mod review;
pub mod tool_calling;
pub mod web_search;

use std::path::Path;

use crate::error::AgentError;

pub use parse::{parse_agent_reply, AgentDecision, NO_TOOL_MARKER, USE_TOOL_MARKER};

/// Writes a recipe's final text to `path`.
pub async fn save_output(path: impl AsRef<Path>, content: &str) -> Result<(), AgentError> {
    tokio::fs::write(path.as_ref(), content).await?;
    tracing::info!(path = %path.as_ref().display(), bytes = content.len(), "saved output");
    Ok(())
}
