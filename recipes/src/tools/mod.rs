//! Tools: the `Tool` trait, a name-keyed registry, and the concrete tools
//! (DuckDuckGo, Serper, GitHub, demo profile tools).

pub mod duckduckgo;
pub mod github;
pub mod profile;
mod registry;
pub mod serper;
mod r#trait;

pub use duckduckgo::{DuckDuckGoSearch, OutputFormat, SearchResult, SearchSource, TOOL_WEB_SEARCH};
pub use github::{github_tools, GitHubAction, GitHubApi, GitHubConfig, GitHubTool};
pub use profile::{GreetUserTool, ValidateUserTool, TOOL_GREET_USER, TOOL_VALIDATE_USER};
pub use r#trait::Tool;
pub use registry::ToolRegistry;
pub use serper::SerperSearch;
