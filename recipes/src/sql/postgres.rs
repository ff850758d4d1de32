//! PostgreSQL backend (sqlx). Rows are fetched as `row_to_json` text so any
//! column type renders without per-type decoding; column order comes from
//! the statement description.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Column, Executor};

use super::{quote_ident, QueryRows, SqlDatabase, SqlError, SqlValue};

fn query_err(e: sqlx::Error) -> SqlError {
    SqlError::Query(e.to_string())
}

#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Connects with a single pooled connection; gives up after five seconds.
    pub async fn connect(url: &str) -> Result<Self, SqlError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl SqlDatabase for PostgresDatabase {
    fn dialect(&self) -> &str {
        "postgresql"
    }

    async fn table_names(&self) -> Result<Vec<String>, SqlError> {
        sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)
    }

    async fn query(&self, sql: &str) -> Result<QueryRows, SqlError> {
        let sql = sql.trim().trim_end_matches(';');
        tracing::debug!(sql, "postgres query");
        let described = (&self.pool).describe(sql).await.map_err(query_err)?;
        let columns: Vec<String> = described
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let wrapped = format!("SELECT row_to_json(q)::text FROM ({sql}) q");
        let json_rows = sqlx::query_scalar::<_, String>(&wrapped)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        let mut rows = Vec::with_capacity(json_rows.len());
        for text in json_rows {
            let obj: serde_json::Value =
                serde_json::from_str(&text).map_err(|e| SqlError::Query(e.to_string()))?;
            rows.push(
                columns
                    .iter()
                    .map(|c| obj.get(c).map(SqlValue::from_json).unwrap_or(SqlValue::Null))
                    .collect(),
            );
        }
        Ok(QueryRows { columns, rows })
    }

    async fn create_statement(&self, table: &str) -> Result<String, SqlError> {
        let cols: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text, is_nullable::text \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;
        if cols.is_empty() {
            return Err(SqlError::Query(format!("no such table: {table}")));
        }
        let defs: Vec<String> = cols
            .iter()
            .map(|(name, ty, nullable)| {
                let not_null = if nullable == "NO" { " NOT NULL" } else { "" };
                format!("\t{} {}{}", quote_ident(name), ty.to_uppercase(), not_null)
            })
            .collect();
        Ok(format!(
            "CREATE TABLE {} (\n{}\n)",
            quote_ident(table),
            defs.join(",\n")
        ))
    }

    async fn ping(&self) -> Result<(), SqlError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| SqlError::Connection(e.to_string()))
    }
}
