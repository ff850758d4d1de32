//! GitHub toolkit: read-only repository tools named the way models expect them.

mod api;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

pub use api::{GitHubApi, GitHubConfig};

use crate::tool_source::{string_arg, ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

pub const TOOL_GET_ISSUES: &str = "Get Issues";
pub const TOOL_GET_ISSUE: &str = "Get Issue";
pub const TOOL_SEARCH_ISSUES: &str = "Search issues and pull requests";
pub const TOOL_LIST_BRANCHES: &str = "List branches in this repository";
pub const TOOL_FILES_OVERVIEW: &str = "Overview of existing files in Main branch";
pub const TOOL_READ_FILE: &str = "Read File";
pub const TOOL_LIST_REPOSITORIES: &str = "List Github Repositories";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubAction {
    GetIssues,
    GetIssue,
    SearchIssues,
    ListBranches,
    FilesOverview,
    ReadFile,
    ListRepositories,
}

impl GitHubAction {
    pub const ALL: [GitHubAction; 7] = [
        Self::GetIssues,
        Self::GetIssue,
        Self::SearchIssues,
        Self::ListBranches,
        Self::FilesOverview,
        Self::ReadFile,
        Self::ListRepositories,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GetIssues => TOOL_GET_ISSUES,
            Self::GetIssue => TOOL_GET_ISSUE,
            Self::SearchIssues => TOOL_SEARCH_ISSUES,
            Self::ListBranches => TOOL_LIST_BRANCHES,
            Self::FilesOverview => TOOL_FILES_OVERVIEW,
            Self::ReadFile => TOOL_READ_FILE,
            Self::ListRepositories => TOOL_LIST_REPOSITORIES,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::GetIssues => "Fetches a list of open issues in the repository. No input.",
            Self::GetIssue => "Fetches title, body and comments of one issue. Input: the issue number.",
            Self::SearchIssues => "Searches issues and pull requests in the repository. Input: a search query.",
            Self::ListBranches => "Lists all branches in the repository. No input.",
            Self::FilesOverview => "Lists every file path in the main branch of the repository. No input.",
            Self::ReadFile => "Reads a file from the repository. Input: the file path, e.g. src/main.rs.",
            Self::ListRepositories => "Lists the repositories of the repository owner. No input.",
        }
    }

    /// Argument key for tools that take input.
    fn input_key(self) -> Option<&'static str> {
        match self {
            Self::GetIssue => Some("issue_number"),
            Self::SearchIssues => Some("search_query"),
            Self::ReadFile => Some("formatted_filepath"),
            _ => None,
        }
    }
}

/// One GitHub tool over a shared [`GitHubApi`].
#[derive(Debug, Clone)]
pub struct GitHubTool {
    api: Arc<GitHubApi>,
    action: GitHubAction,
}

impl GitHubTool {
    pub fn new(api: Arc<GitHubApi>, action: GitHubAction) -> Self {
        Self { api, action }
    }

    pub fn action(&self) -> GitHubAction {
        self.action
    }
}

fn parse_issue_number(raw: &str) -> Result<u64, ToolSourceError> {
    raw.trim()
        .trim_start_matches('#')
        .split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ToolSourceError::InvalidInput(format!("not an issue number: {raw:?}")))
}

#[async_trait]
impl Tool for GitHubTool {
    fn name(&self) -> &str {
        self.action.name()
    }

    fn spec(&self) -> ToolSpec {
        let input_schema = match self.action.input_key() {
            Some(key) => json!({
                "type": "object",
                "properties": { key: { "type": "string" } },
                "required": [key]
            }),
            None => json!({ "type": "object", "properties": {} }),
        };
        ToolSpec {
            name: self.action.name().to_string(),
            description: Some(self.action.description().to_string()),
            input_schema,
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let input = || match self.action.input_key() {
            Some(key) => string_arg(&args, key),
            None => Ok(String::new()),
        };
        let text = match self.action {
            GitHubAction::GetIssues => self.api.get_issues().await?,
            GitHubAction::GetIssue => self.api.get_issue(parse_issue_number(&input()?)?).await?,
            GitHubAction::SearchIssues => self.api.search_issues_and_prs(&input()?).await?,
            GitHubAction::ListBranches => self.api.list_branches().await?,
            GitHubAction::FilesOverview => self.api.list_files().await?,
            GitHubAction::ReadFile => self.api.read_file(&input()?).await?,
            GitHubAction::ListRepositories => self.api.list_repositories().await?,
        };
        Ok(ToolCallContent::text(text))
    }
}

/// All seven tools over one API client, in a stable order.
pub fn github_tools(api: Arc<GitHubApi>) -> Vec<Arc<dyn Tool>> {
    GitHubAction::ALL
        .into_iter()
        .map(|a| Arc::new(GitHubTool::new(api.clone(), a)) as Arc<dyn Tool>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Issue numbers are found in "#12", "12" and "issue 12 please".
    #[test]
    fn parse_issue_number_forms() {
        assert_eq!(parse_issue_number("#12").unwrap(), 12);
        assert_eq!(parse_issue_number(" 7 ").unwrap(), 7);
        assert_eq!(parse_issue_number("issue 12 please").unwrap(), 12);
        assert!(parse_issue_number("none").is_err());
    }

    /// **Scenario**: Tools that take input advertise their argument key.
    #[tokio::test]
    async fn input_tools_declare_argument() {
        let api = Arc::new(GitHubApi::new(GitHubConfig::new("o/r")).unwrap());
        let tool = GitHubTool::new(api, GitHubAction::ReadFile);
        assert_eq!(tool.spec().input_schema["required"][0], "formatted_filepath");
        assert_eq!(tool.name(), "Read File");
    }
}
