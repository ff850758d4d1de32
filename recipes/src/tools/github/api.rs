//! Read-only GitHub REST client for one repository.

use base64::Engine;
use octocrab::Octocrab;
use serde_json::Value;

use crate::tool_source::ToolSourceError;

/// Where the toolkit points: `owner/name`, branch, optional token and API base.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub repository: String,
    pub branch: String,
    pub token: Option<String>,
    /// Defaults to `https://api.github.com/`.
    pub base_url: Option<String>,
}

impl GitHubConfig {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            branch: "main".to_string(),
            token: None,
            base_url: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

fn transport(e: impl std::fmt::Display) -> ToolSourceError {
    ToolSourceError::Transport(format!("GitHub API error: {e}"))
}

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// GitHub API wrapper used by every GitHub tool.
///
/// **Interaction**: Shared as `Arc<GitHubApi>` by the tools from
/// [`github_tools`](super::github_tools).
#[derive(Clone)]
pub struct GitHubApi {
    octo: Octocrab,
    owner: String,
    repo: String,
    branch: String,
}

impl std::fmt::Debug for GitHubApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApi")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish()
    }
}

impl GitHubApi {
    pub fn new(config: GitHubConfig) -> Result<Self, ToolSourceError> {
        let (owner, repo) = config
            .repository
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty())
            .ok_or_else(|| {
                ToolSourceError::InvalidInput(format!(
                    "repository must be owner/name, got {:?}",
                    config.repository
                ))
            })?;
        let mut builder = Octocrab::builder();
        if let Some(token) = config.token {
            builder = builder.personal_token(token);
        }
        if let Some(base) = config.base_url {
            builder = builder.base_url(base).map_err(transport)?;
        }
        let octo = builder.build().map_err(transport)?;
        Ok(Self {
            octo,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: config.branch,
        })
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    async fn get(&self, route: &str, params: &[(&str, &str)]) -> Result<Value, ToolSourceError> {
        tracing::debug!(route, "github get");
        self.octo
            .get::<Value, _, _>(route, Some(&params))
            .await
            .map_err(transport)
    }

    fn repo_route(&self, tail: &str) -> String {
        format!("/repos/{}/{}/{}", self.owner, self.repo, tail)
    }

    /// Open issues as `Found N issues:` plus one line per issue.
    pub async fn get_issues(&self) -> Result<String, ToolSourceError> {
        let issues = self.get(&self.repo_route("issues"), &[("state", "open")]).await?;
        let list = issues.as_array().map(Vec::as_slice).unwrap_or(&[]);
        if list.is_empty() {
            return Ok("No open issues available".to_string());
        }
        let lines: Vec<String> = list
            .iter()
            .map(|i| {
                format!(
                    "title: {}, number: {}, opened_by: {}",
                    str_field(i, "title"),
                    i.get("number").and_then(Value::as_u64).unwrap_or_default(),
                    i.get("user").map(|u| str_field(u, "login")).unwrap_or_default()
                )
            })
            .collect();
        Ok(format!("Found {} issues:\n{}", lines.len(), lines.join("\n")))
    }

    /// One issue with its comments, as JSON text.
    pub async fn get_issue(&self, number: u64) -> Result<String, ToolSourceError> {
        let issue = self.get(&self.repo_route(&format!("issues/{number}")), &[]).await?;
        let comments = self
            .get(&self.repo_route(&format!("issues/{number}/comments")), &[])
            .await?;
        let comments: Vec<Value> = comments
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|c| {
                serde_json::json!({
                    "body": str_field(c, "body"),
                    "user": c.get("user").map(|u| str_field(u, "login")).unwrap_or_default(),
                })
            })
            .collect();
        let out = serde_json::json!({
            "number": number,
            "title": str_field(&issue, "title"),
            "body": str_field(&issue, "body"),
            "comments": comments,
            "opened_by": issue.get("user").map(|u| str_field(u, "login")).unwrap_or_default(),
        });
        Ok(out.to_string())
    }

    /// Top five issue/PR search hits within this repository.
    pub async fn search_issues_and_prs(&self, query: &str) -> Result<String, ToolSourceError> {
        let q = format!("{} repo:{}", query, self.repository());
        let found = self.get("/search/issues", &[("q", q.as_str())]).await?;
        let items = found
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let max = items.len().min(5);
        let mut lines = vec![format!("Top {max} results:")];
        for item in &items[..max] {
            lines.push(format!(
                "Title: {}, Number: {}, State: {}",
                str_field(item, "title"),
                item.get("number").and_then(Value::as_u64).unwrap_or_default(),
                str_field(item, "state")
            ));
        }
        Ok(lines.join("\n"))
    }

    pub async fn list_branches(&self) -> Result<String, ToolSourceError> {
        let branches = self.get(&self.repo_route("branches"), &[]).await?;
        let names: Vec<&str> = branches
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|b| str_field(b, "name"))
            .collect();
        if names.is_empty() {
            return Ok("No branches found in the repository".to_string());
        }
        Ok(format!(
            "Found {} branches in the repository:\n{}",
            names.len(),
            names.join("\n")
        ))
    }

    /// Every file path on the configured branch (git tree, recursive).
    pub async fn list_files(&self) -> Result<String, ToolSourceError> {
        let tree = self
            .get(
                &self.repo_route(&format!("git/trees/{}", self.branch)),
                &[("recursive", "1")],
            )
            .await?;
        let files: Vec<&str> = tree
            .get("tree")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter(|e| str_field(e, "type") == "blob")
            .map(|e| str_field(e, "path"))
            .collect();
        Ok(format!(
            "Found {} files in the {} branch:\n{}",
            files.len(),
            self.branch,
            files.join("\n")
        ))
    }

    /// Decoded text of `path` on the configured branch.
    pub async fn read_file(&self, path: &str) -> Result<String, ToolSourceError> {
        let path = path.trim().trim_start_matches('/');
        let item = self
            .get(
                &self.repo_route(&format!("contents/{path}")),
                &[("ref", self.branch.as_str())],
            )
            .await
            .map_err(|e| {
                ToolSourceError::Execution(format!(
                    "File not found `{path}` on branch `{}`. Error: {e}",
                    self.branch
                ))
            })?;
        let encoded = item
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolSourceError::Execution(format!("`{path}` is not a file")))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.replace('\n', ""))
            .map_err(|e| ToolSourceError::Execution(format!("base64 decode error: {e}")))?;
        String::from_utf8(bytes).map_err(|e| ToolSourceError::Execution(e.to_string()))
    }

    /// Repositories owned by the repository's owner.
    pub async fn list_repositories(&self) -> Result<String, ToolSourceError> {
        let repos = self
            .get(&format!("/users/{}/repos", self.owner), &[("per_page", "100")])
            .await?;
        let names: Vec<&str> = repos
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|r| str_field(r, "full_name"))
            .collect();
        Ok(format!(
            "Found {} repositories for {}:\n{}",
            names.len(),
            self.owner,
            names.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Repository strings without an owner/name split are rejected.
    #[test]
    fn new_rejects_bad_repository() {
        for bad in ["noslash", "/name", "owner/"] {
            let err = GitHubApi::new(GitHubConfig::new(bad)).unwrap_err();
            assert!(matches!(err, ToolSourceError::InvalidInput(_)), "{bad}");
        }
    }
}
