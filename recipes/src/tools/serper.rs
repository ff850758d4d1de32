//! Google search through the Serper API (`google.serper.dev`).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool_source::{string_arg, ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

pub const TOOL_SERPER_SEARCH: &str = "google_serper";
pub const NO_RESULTS: &str = "No good Google Search Result was found";

const SERPER_BASE_URL: &str = "https://google.serper.dev";

fn attributes(v: &Value) -> impl Iterator<Item = (&String, String)> {
    v.get("attributes")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .map(|(k, v)| (k, v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
}

/// Collapses a Serper response to snippets: the answer box wins outright,
/// otherwise knowledge-graph facts followed by up to `k` organic snippets.
pub fn parse_snippets(results: &Value, k: usize) -> Vec<String> {
    if let Some(answer_box) = results.get("answerBox") {
        if let Some(answer) = answer_box.get("answer").and_then(Value::as_str) {
            return vec![answer.to_string()];
        }
        if let Some(snippet) = answer_box.get("snippet").and_then(Value::as_str) {
            return vec![snippet.replace('\n', " ")];
        }
        if let Some(hl) = answer_box.get("snippetHighlighted").and_then(Value::as_array) {
            return hl.iter().filter_map(Value::as_str).map(str::to_string).collect();
        }
    }

    let mut snippets = Vec::new();
    if let Some(kg) = results.get("knowledgeGraph") {
        let title = kg.get("title").and_then(Value::as_str).unwrap_or_default();
        if let Some(entity_type) = kg.get("type").and_then(Value::as_str) {
            snippets.push(format!("{title}: {entity_type}."));
        }
        if let Some(description) = kg.get("description").and_then(Value::as_str) {
            snippets.push(description.to_string());
        }
        for (attr, value) in attributes(kg) {
            snippets.push(format!("{title} {attr}: {value}."));
        }
    }
    let organic = results
        .get("organic")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    for result in organic.iter().take(k) {
        if let Some(snippet) = result.get("snippet").and_then(Value::as_str) {
            snippets.push(snippet.to_string());
        }
        for (attr, value) in attributes(result) {
            snippets.push(format!("{attr}: {value}."));
        }
    }
    if snippets.is_empty() {
        snippets.push(NO_RESULTS.to_string());
    }
    snippets
}

/// Serper web search. Needs `SERPER_API_KEY`.
///
/// **Interaction**: Used by `search serper`; also registrable as a tool.
#[derive(Debug, Clone)]
pub struct SerperSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    pub gl: String,
    pub hl: String,
    pub k: usize,
}

impl SerperSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: SERPER_BASE_URL.to_string(),
            gl: "us".to_string(),
            hl: "en".to_string(),
            k: 10,
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Raw Serper JSON for `query`.
    pub async fn results(&self, query: &str) -> Result<Value, ToolSourceError> {
        let body = json!({ "q": query, "gl": self.gl, "hl": self.hl, "num": self.k });
        tracing::debug!(query, "serper search");
        let res = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let err_body = res.text().await.unwrap_or_default();
            return Err(ToolSourceError::Transport(format!(
                "Serper API error {status}: {err_body}"
            )));
        }
        res.json()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))
    }

    /// Snippets joined by a space.
    pub async fn run(&self, query: &str) -> Result<String, ToolSourceError> {
        let results = self.results(query).await?;
        Ok(parse_snippets(&results, self.k).join(" "))
    }
}

#[async_trait]
impl Tool for SerperSearch {
    fn name(&self) -> &str {
        TOOL_SERPER_SEARCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SERPER_SEARCH.to_string(),
            description: Some(
                "A low-cost Google Search API. Useful for answering questions about current events."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let query = string_arg(&args, "query")?;
        Ok(ToolCallContent::text(self.run(&query).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: An answer box answer short-circuits everything else.
    #[test]
    fn answer_box_wins() {
        let v = json!({
            "answerBox": {"answer": "Austin"},
            "organic": [{"snippet": "ignored"}]
        });
        assert_eq!(parse_snippets(&v, 10), vec!["Austin"]);
        let v = json!({"answerBox": {"snippet": "line one\nline two"}});
        assert_eq!(parse_snippets(&v, 10), vec!["line one line two"]);
    }

    /// **Scenario**: Knowledge graph facts come before organic snippets and attributes.
    #[test]
    fn knowledge_graph_then_organic() {
        let v = json!({
            "knowledgeGraph": {"title": "Tesla", "type": "Company", "description": "EV maker",
                               "attributes": {"CEO": "Elon Musk"}},
            "organic": [{"snippet": "TSLA up", "attributes": {"Price": "200"}}, {"snippet": "cut"}]
        });
        assert_eq!(
            parse_snippets(&v, 1),
            vec!["Tesla: Company.", "EV maker", "Tesla CEO: Elon Musk.", "TSLA up", "Price: 200."]
        );
    }

    /// **Scenario**: No usable fields yields the fixed no-result message.
    #[test]
    fn empty_response_message() {
        assert_eq!(parse_snippets(&json!({}), 10), vec![NO_RESULTS]);
    }
}
