//! SQLite backend (rusqlite). One connection, used from `spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};

use super::{QueryRows, SqlDatabase, SqlError, SqlValue};

fn query_err(e: impl std::fmt::Display) -> SqlError {
    SqlError::Query(e.to_string())
}

fn to_value(v: ValueRef<'_>) -> SqlValue {
    match v {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(r) => SqlValue::Real(r),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Other(format!("<{} bytes>", b.len())),
    }
}

#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SqliteDatabase")
    }
}

impl SqliteDatabase {
    /// Opens (creating if missing) the database file; `:memory:` is accepted.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqlError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| SqlError::Connection(format!("{}: {e}", path.as_ref().display())))?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs a batch of statements (schema setup, fixtures).
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlError> {
        let sql = sql.to_string();
        self.with_conn(move |conn| conn.execute_batch(&sql).map_err(query_err))
            .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, SqlError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SqlError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| SqlError::Query("sqlite connection lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(query_err)?
    }
}

#[async_trait]
impl SqlDatabase for SqliteDatabase {
    fn dialect(&self) -> &str {
        "sqlite"
    }

    async fn table_names(&self) -> Result<Vec<String>, SqlError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )
                .map_err(query_err)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(query_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(query_err)?;
            Ok(names)
        })
        .await
    }

    async fn query(&self, sql: &str) -> Result<QueryRows, SqlError> {
        let sql = sql.to_string();
        tracing::debug!(sql = %sql, "sqlite query");
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(query_err)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let width = columns.len();
            let mut rows = stmt.query([]).map_err(query_err)?;
            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(query_err)? {
                let mut cells = Vec::with_capacity(width);
                for i in 0..width {
                    cells.push(to_value(row.get_ref(i).map_err(query_err)?));
                }
                out.push(cells);
            }
            Ok(QueryRows { columns, rows: out })
        })
        .await
    }

    async fn create_statement(&self, table: &str) -> Result<String, SqlError> {
        let table = table.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&table],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(query_err)?
            .ok_or_else(|| SqlError::Query(format!("no such table: {table}")))
        })
        .await
    }

    async fn ping(&self) -> Result<(), SqlError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| SqlError::Connection(e.to_string()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn city_db() -> SqliteDatabase {
        let db = SqliteDatabase::open(":memory:").unwrap();
        db.execute_batch(
            "CREATE TABLE city (name TEXT NOT NULL, population INTEGER, country TEXT);
             INSERT INTO city VALUES ('Tokyo', 37400068, 'Japan');
             INSERT INTO city VALUES ('Delhi', 28514000, 'India');
             INSERT INTO city VALUES ('Dhaka', 21006000, 'Bangladesh');
             INSERT INTO city VALUES ('Cairo', 20076000, 'Egypt');",
        )
        .await
        .unwrap();
        db
    }

    /// **Scenario**: table_info shows the CREATE statement and three sample rows.
    #[tokio::test]
    async fn table_info_has_create_and_three_rows() {
        let db = city_db().await;
        assert_eq!(db.table_names().await.unwrap(), vec!["city"]);
        let info = db.table_info(None).await.unwrap();
        assert!(info.starts_with("CREATE TABLE city"), "{info}");
        assert!(info.contains("3 rows from city table:\nname\tpopulation\tcountry"), "{info}");
        assert!(info.contains("Dhaka\t21006000\tBangladesh"), "{info}");
        assert!(!info.contains("Cairo"), "{info}");
    }

    /// **Scenario**: run renders rows as tuples; a bad query is a Query error.
    #[tokio::test]
    async fn run_renders_rows() {
        let db = city_db().await;
        let out = db
            .run("SELECT name, population FROM city ORDER BY population DESC LIMIT 2")
            .await
            .unwrap();
        assert_eq!(out, "[('Tokyo', 37400068), ('Delhi', 28514000)]");
        assert!(matches!(db.run("SELECT nope FROM city").await, Err(SqlError::Query(_))));
        db.ping().await.unwrap();
    }
}
