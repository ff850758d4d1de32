//! # Recipes
//!
//! Small, runnable recipes around a locally hosted language model: plain chat,
//! prompt chains, tool calling, web search, a text-to-SQL chain, token counting,
//! and a handful of state-graph agents that loop a model over tools.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`]; a minimal
//!   state-in, state-out runtime with conditional edges and a recursion limit.
//! - [`memory`]: [`Checkpointer`], [`MemorySaver`], [`SqliteSaver`], [`RunnableConfig`].
//! - [`llm`]: [`LlmClient`] with [`ChatOllama`] and [`MockLlm`]; [`Embedder`] with [`OllamaEmbedder`].
//! - [`prompt`]: [`ChatPromptTemplate`] with `{variable}` templates and message placeholders.
//! - [`tools`]: [`Tool`], [`ToolRegistry`], DuckDuckGo and Serper search, the GitHub toolkit.
//! - [`sql`]: [`SqlDatabase`] over SQLite and Postgres, [`SqlQueryChain`].
//! - [`tokens`]: [`count_tokens`] over the tiktoken encodings.
//! - [`agent`]: the recipe graphs (web search, review, GitHub, tool calling, counter).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recipes::agent::web_search::{build_web_search_graph, run_web_search, DEFAULT_MAX_ITERATIONS};
//! use recipes::{ChatOllama, DuckDuckGoSearch, ToolRegistry};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(ChatOllama::new("phi4:latest").with_temperature(0.2));
//! let tools = ToolRegistry::new().with(Arc::new(DuckDuckGoSearch::new()));
//! let graph = build_web_search_graph(llm, tools, DEFAULT_MAX_ITERATIONS)?;
//! println!("{}", run_web_search(&graph, "What are the latest news about AI?").await?);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod prompt;
pub mod sql;
pub mod tokens;
pub mod tool_source;
pub mod tools;

pub use error::AgentError;
pub use graph::{
    generate_mermaid, CompilationError, CompiledStateGraph, FnNode, Next, Node, StateGraph, END,
    START,
};
pub use llm::{ChatOllama, Embedder, LlmClient, LlmResponse, MockLlm, OllamaEmbedder, ToolCall};
pub use memory::{
    Checkpoint, CheckpointError, Checkpointer, JsonSerializer, MemorySaver, RunnableConfig,
    SqliteSaver,
};
pub use message::Message;
pub use prompt::ChatPromptTemplate;
pub use sql::{connect, SqlDatabase, SqlError, SqlQueryChain};
pub use tokens::{count_tokens, TokenCount, TokenError};
pub use tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
pub use tools::{DuckDuckGoSearch, GitHubApi, GitHubConfig, SerperSearch, Tool, ToolRegistry};
