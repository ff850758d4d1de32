//! Checkpointing: save the final state of a graph run per thread.
//!
//! [`MemorySaver`] keeps checkpoints in process; [`SqliteSaver`] writes them to
//! one SQLite file so a later process can resume from the saved state.

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};
pub use sqlite_saver::SqliteSaver;
