//! DuckDuckGo search tool: HTML text results or the news JSON endpoint.
//!
//! Text search posts the query to `html.duckduckgo.com/html/` and scrapes the
//! result list. News search first fetches a `vqd` token from the landing page,
//! then reads `news.js?o=json`. No API key is needed.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{json, Value};

use crate::tool_source::{string_arg, ToolCallContent, ToolSourceError, ToolSpec};
use crate::tools::Tool;

pub const TOOL_WEB_SEARCH: &str = "web_search_tool";
pub const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

const HTML_BASE_URL: &str = "https://html.duckduckgo.com";
const NEWS_BASE_URL: &str = "https://duckduckgo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchSource {
    #[default]
    Text,
    News,
}

impl std::str::FromStr for SearchSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "news" => Ok(Self::News),
            other => Err(format!("unknown search source: {other} (expected text or news)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `snippet: …, title: …, link: …` per result, joined by `, `.
    #[default]
    String,
    /// JSON array of result objects.
    List,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "list" => Ok(Self::List),
            other => Err(format!("unknown output format: {other} (expected string or list)")),
        }
    }
}

/// One search hit. `date` and `source` are only set for news results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub snippet: String,
    pub title: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchResult {
    fn render(&self) -> String {
        let mut s = format!(
            "snippet: {}, title: {}, link: {}",
            self.snippet, self.title, self.link
        );
        if let Some(date) = &self.date {
            s.push_str(&format!(", date: {date}"));
        }
        if let Some(source) = &self.source {
            s.push_str(&format!(", source: {source}"));
        }
        s
    }
}

/// Renders results per `format`; an empty list becomes [`NO_RESULTS`].
pub fn format_results(results: &[SearchResult], format: OutputFormat) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }
    match format {
        OutputFormat::String => results
            .iter()
            .map(SearchResult::render)
            .collect::<Vec<_>>()
            .join(", "),
        OutputFormat::List => serde_json::to_string(results).unwrap_or_else(|_| NO_RESULTS.to_string()),
    }
}

fn selector(css: &str) -> Result<Selector, ToolSourceError> {
    Selector::parse(css).map_err(|e| ToolSourceError::Execution(format!("selector {css}: {e}")))
}

fn squash(text: impl Iterator<Item = impl AsRef<str>>) -> String {
    let joined: String = text.map(|t| t.as_ref().to_string()).collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Follows DuckDuckGo's `/l/?uddg=<target>` redirect links to the target URL.
pub fn decode_result_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_string()
    };
    url::Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

/// Parses the html.duckduckgo.com result page, skipping ads.
pub fn parse_html_results(body: &str, max_results: usize) -> Result<Vec<SearchResult>, ToolSourceError> {
    let doc = Html::parse_document(body);
    let result_sel = selector(".result")?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;
    let mut out = Vec::new();
    for result in doc.select(&result_sel) {
        if result.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(anchor) = result.select(&title_sel).next() else {
            continue;
        };
        let title = squash(anchor.text());
        let link = decode_result_link(anchor.value().attr("href").unwrap_or_default());
        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(|s| squash(s.text()))
            .unwrap_or_default();
        out.push(SearchResult {
            snippet,
            title,
            link,
            date: None,
            source: None,
        });
        if out.len() >= max_results {
            break;
        }
    }
    Ok(out)
}

static VQD_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r#"vqd=["']?([0-9-]+)["']?"#).ok());
static TAG_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]+>").ok());

/// Pulls the `vqd` token out of the landing page.
pub fn extract_vqd(body: &str) -> Option<String> {
    let re = VQD_RE.as_ref()?;
    re.captures(body).map(|c| c[1].to_string())
}

fn strip_tags(s: &str) -> String {
    match TAG_RE.as_ref() {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    }
}

/// Parses the `news.js` JSON payload. `date` is unix seconds upstream; rendered as RFC 3339.
pub fn parse_news_results(payload: &Value, max_results: usize) -> Vec<SearchResult> {
    let items = payload
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    items
        .iter()
        .take(max_results)
        .map(|r| {
            let text = |k: &str| r.get(k).and_then(Value::as_str).map(strip_tags).unwrap_or_default();
            let date = r
                .get("date")
                .and_then(Value::as_i64)
                .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
                .map(|d| d.to_rfc3339());
            SearchResult {
                snippet: text("excerpt"),
                title: text("title"),
                link: text("url"),
                date,
                source: Some(text("source")),
            }
        })
        .collect()
}

/// DuckDuckGo search exposed as a tool (default name `web_search_tool`).
///
/// **Interaction**: Registered in the web-search agent's `ToolRegistry`; the
/// `search ddg` CLI subcommand calls `search()` directly.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    name: String,
    html_base_url: String,
    news_base_url: String,
    pub region: String,
    /// `d`, `w`, `m` or `y`.
    pub time: Option<String>,
    pub max_results: usize,
    pub source: SearchSource,
    pub output_format: OutputFormat,
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            name: TOOL_WEB_SEARCH.to_string(),
            html_base_url: HTML_BASE_URL.to_string(),
            news_base_url: NEWS_BASE_URL.to_string(),
            region: "wt-wt".to_string(),
            time: None,
            max_results: 5,
            source: SearchSource::Text,
            output_format: OutputFormat::String,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Points both endpoints at `base` (tests use a mock server).
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        self.html_base_url = base.clone();
        self.news_base_url = base;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_time(mut self, time: Option<String>) -> Self {
        self.time = time;
        self
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    pub fn with_source(mut self, source: SearchSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Runs the query against the configured source.
    pub async fn results(&self, query: &str) -> Result<Vec<SearchResult>, ToolSourceError> {
        match self.source {
            SearchSource::Text => self.text_results(query).await,
            SearchSource::News => self.news_results(query).await,
        }
    }

    /// Runs the query and renders it per `output_format`.
    pub async fn search(&self, query: &str) -> Result<String, ToolSourceError> {
        let results = self.results(query).await?;
        Ok(format_results(&results, self.output_format))
    }

    async fn get_text(&self, req: reqwest::RequestBuilder) -> Result<String, ToolSourceError> {
        let res = req
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ToolSourceError::Transport(format!(
                "DuckDuckGo error {status}: {body}"
            )));
        }
        Ok(body)
    }

    async fn text_results(&self, query: &str) -> Result<Vec<SearchResult>, ToolSourceError> {
        let mut form = vec![("q", query.to_string()), ("kl", self.region.clone())];
        if let Some(t) = &self.time {
            form.push(("df", t.clone()));
        }
        tracing::debug!(query, region = %self.region, "duckduckgo text search");
        let body = self
            .get_text(
                self.client
                    .post(format!("{}/html/", self.html_base_url))
                    .form(&form),
            )
            .await?;
        parse_html_results(&body, self.max_results)
    }

    async fn news_results(&self, query: &str) -> Result<Vec<SearchResult>, ToolSourceError> {
        tracing::debug!(query, region = %self.region, "duckduckgo news search");
        let landing = self
            .get_text(self.client.get(format!("{}/", self.news_base_url)).query(&[("q", query)]))
            .await?;
        let vqd = extract_vqd(&landing)
            .ok_or_else(|| ToolSourceError::Execution("DuckDuckGo vqd token not found".into()))?;
        let mut params = vec![
            ("l", self.region.clone()),
            ("o", "json".to_string()),
            ("noamp", "1".to_string()),
            ("q", query.to_string()),
            ("vqd", vqd),
            ("p", "-1".to_string()),
        ];
        if let Some(t) = &self.time {
            params.push(("df", t.clone()));
        }
        let body = self
            .get_text(
                self.client
                    .get(format!("{}/news.js", self.news_base_url))
                    .query(&params),
            )
            .await?;
        let payload: Value =
            serde_json::from_str(&body).map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        Ok(parse_news_results(&payload, self.max_results))
    }
}

#[async_trait]
impl Tool for DuckDuckGoSearch {
    fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: Some("Conduct a web search based on the provided query.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": { "query": { "type": "string", "description": "Search query" } },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolCallContent, ToolSourceError> {
        let query = string_arg(&args, "query")?;
        Ok(ToolCallContent::text(self.search(&query).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<div class="result results_links result--ad">
  <a class="result__a" href="https://ads.example/">Sponsored</a>
  <a class="result__snippet">Buy now</a>
</div>
<div class="result results_links web-result">
  <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FDhaka&amp;rut=abc">Dhaka - Wikipedia</a></h2>
  <a class="result__snippet">Dhaka is the  capital of Bangladesh.</a>
</div>
<div class="result results_links web-result">
  <h2><a class="result__a" href="https://example.com/b">Second</a></h2>
  <a class="result__snippet">Other</a>
</div>
</body></html>"#;

    /// **Scenario**: HTML results skip ads, decode redirect links and honour max_results.
    #[test]
    fn parse_html_results_skips_ads_and_decodes_links() {
        let results = parse_html_results(PAGE, 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dhaka - Wikipedia");
        assert_eq!(results[0].link, "https://en.wikipedia.org/wiki/Dhaka");
        assert_eq!(results[0].snippet, "Dhaka is the capital of Bangladesh.");
    }

    /// **Scenario**: String output joins `key: value` fields; empty results give the fixed message.
    #[test]
    fn format_results_string_and_empty() {
        let r = SearchResult {
            snippet: "s".into(),
            title: "t".into(),
            link: "l".into(),
            date: Some("d".into()),
            source: Some("src".into()),
        };
        assert_eq!(
            format_results(&[r.clone(), r], OutputFormat::String),
            "snippet: s, title: t, link: l, date: d, source: src, snippet: s, title: t, link: l, date: d, source: src"
        );
        assert_eq!(format_results(&[], OutputFormat::List), NO_RESULTS);
    }

    /// **Scenario**: vqd token is found in both quoted and bare forms.
    #[test]
    fn extract_vqd_forms() {
        assert_eq!(extract_vqd("x vqd=\"4-1234-5678\" y").as_deref(), Some("4-1234-5678"));
        assert_eq!(extract_vqd("&vqd=4-99&").as_deref(), Some("4-99"));
        assert!(extract_vqd("nothing here").is_none());
    }

    /// **Scenario**: Shared patterns compile once and strip markup on every call.
    #[test]
    fn shared_patterns_compile_and_strip() {
        assert!(VQD_RE.is_some());
        assert!(TAG_RE.is_some());
        assert_eq!(strip_tags("<b>a</b> b"), "a b");
        assert_eq!(strip_tags("<i>c</i>"), "c");
        assert_eq!(strip_tags("plain"), "plain");
    }

    /// **Scenario**: News payload maps excerpt/url/source, strips markup and renders the date.
    #[test]
    fn parse_news_results_maps_fields() {
        let payload = json!({"results": [{
            "date": 0,
            "title": "<b>Tesla</b> shares",
            "excerpt": "Shares rose",
            "url": "https://news.example/t",
            "source": "Example News"
        }]});
        let r = &parse_news_results(&payload, 5)[0];
        assert_eq!(r.title, "Tesla shares");
        assert_eq!(r.link, "https://news.example/t");
        assert_eq!(r.source.as_deref(), Some("Example News"));
        assert_eq!(r.date.as_deref(), Some("1970-01-01T00:00:00+00:00"));
    }

    /// **Scenario**: Source and format names parse; unknown names are rejected.
    #[test]
    fn parse_source_and_format() {
        assert_eq!("news".parse::<SearchSource>().unwrap(), SearchSource::News);
        assert_eq!("list".parse::<OutputFormat>().unwrap(), OutputFormat::List);
        assert!("images".parse::<SearchSource>().is_err());
    }
}
