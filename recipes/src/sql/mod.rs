//! SQL databases and the text-to-SQL query chain.
//!
//! [`connect`] picks a backend from the URL scheme: `sqlite:` opens a file with
//! rusqlite, `postgres:` / `postgresql:` (including SQLAlchemy's
//! `postgresql+psycopg2:`) connects through sqlx.

mod postgres;
mod query_chain;
mod sqlite;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::AgentError;

pub use postgres::PostgresDatabase;
pub use query_chain::{parse_sql_reply, SqlQueryChain, DEFAULT_TOP_K};
pub use sqlite::SqliteDatabase;

/// Sample rows shown per table in `table_info`.
pub const SAMPLE_ROWS: usize = 3;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("unsupported database url: {0}")]
    UnsupportedUrl(String),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// One cell of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    /// Anything else, already rendered.
    Other(String),
}

impl SqlValue {
    fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Real).unwrap_or_else(|| Self::Other(n.to_string())),
            },
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Other(other.to_string()),
        }
    }

    /// Unquoted form used in sample-row tables.
    fn plain(&self) -> String {
        match self {
            Self::Null => "None".to_string(),
            Self::Text(s) | Self::Other(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Python-literal rendering (`'text'`, `None`, `True`), as chains expect to read results.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r:?}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Column names plus rows of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryRows {
    /// `[(v1, v2), ...]`; a single-column row renders as `(v,)`. Empty result is `""`.
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|r| {
                let cells: Vec<String> = r.iter().map(ToString::to_string).collect();
                if cells.len() == 1 {
                    format!("({},)", cells[0])
                } else {
                    format!("({})", cells.join(", "))
                }
            })
            .collect();
        format!("[{}]", rows.join(", "))
    }

    /// Tab-separated header and rows, used inside `table_info` comments.
    pub fn render_sample(&self, table: &str) -> String {
        let mut out = format!("/*\n{} rows from {} table:\n{}", SAMPLE_ROWS, table, self.columns.join("\t"));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.iter().map(SqlValue::plain).collect::<Vec<_>>().join("\t"));
        }
        out.push_str("\n*/");
        out
    }
}

/// A database the query chain can describe and query.
///
/// **Interaction**: `SqlQueryChain` reads `dialect` and `table_info` for its
/// prompt and calls `run` for `invoke_and_run`. The `db-check` subcommand calls `ping`.
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    /// Dialect name for prompts, e.g. `sqlite` or `postgresql`.
    fn dialect(&self) -> &str;

    async fn table_names(&self) -> Result<Vec<String>, SqlError>;

    /// Rows of an arbitrary query.
    async fn query(&self, sql: &str) -> Result<QueryRows, SqlError>;

    /// CREATE statement of `table`.
    async fn create_statement(&self, table: &str) -> Result<String, SqlError>;

    async fn ping(&self) -> Result<(), SqlError>;

    /// CREATE statement plus sample rows for each table (all tables when `None`).
    async fn table_info(&self, tables: Option<&[String]>) -> Result<String, SqlError> {
        let names = match tables {
            Some(t) => t.to_vec(),
            None => self.table_names().await?,
        };
        let mut parts = Vec::with_capacity(names.len());
        for table in &names {
            let create = self.create_statement(table).await?;
            let sample = self
                .query(&format!(
                    "SELECT * FROM {} LIMIT {}",
                    quote_ident(table),
                    SAMPLE_ROWS
                ))
                .await?;
            parts.push(format!("{}\n\n{}", create.trim(), sample.render_sample(table)));
        }
        Ok(parts.join("\n\n"))
    }

    /// Runs `sql` and renders the rows.
    async fn run(&self, sql: &str) -> Result<String, SqlError> {
        Ok(self.query(sql).await?.render())
    }
}

/// Double-quoted SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Opens a database from a URL.
///
/// Accepted: `sqlite:path`, `sqlite://path`, `sqlite:///relative`, `sqlite:////absolute`,
/// `postgres://…`, `postgresql://…`, `postgresql+<driver>://…`.
pub async fn connect(url: &str) -> Result<Arc<dyn SqlDatabase>, SqlError> {
    if let Some(path) = sqlite_path(url) {
        return Ok(Arc::new(SqliteDatabase::open(path)?));
    }
    if let Some(pg) = postgres_url(url) {
        return Ok(Arc::new(PostgresDatabase::connect(&pg).await?));
    }
    Err(SqlError::UnsupportedUrl(url.to_string()))
}

fn sqlite_path(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite:")?;
    Some(
        rest.strip_prefix("///")
            .or_else(|| rest.strip_prefix("//"))
            .unwrap_or(rest),
    )
}

fn postgres_url(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let base = scheme.split('+').next()?;
    matches!(base, "postgres" | "postgresql").then(|| format!("postgresql://{rest}"))
}
