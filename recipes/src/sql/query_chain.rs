//! Text-to-SQL chain: prompt with the schema, ask the model, clean the reply.

use std::sync::Arc;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::prompt::{vars, ChatPromptTemplate};

use super::{SqlDatabase, SqlError};

pub const DEFAULT_TOP_K: usize = 5;

const SQL_PROMPT: &str = "You are a {dialect} expert. Given an input question, first create a syntactically correct {dialect} query to run, then look at the results of the query and return the answer to the input question.
Unless the user specifies in the question a specific number of examples to obtain, query for at most {top_k} results using the LIMIT clause as per {dialect}. You can order the results to return the most informative data in the database.
Never query for all columns from a table. You must query only the columns that are needed to answer the question.
Pay attention to use only the column names you can see in the tables below. Be careful to not query for columns that do not exist. Also, pay attention to which column is in which table.

Use the following format:

Question: Question here
SQLQuery: SQL Query to run
SQLResult: Result of the SQLQuery
Answer: Final answer here

Only use the following tables:
{table_info}

Question: {input}
SQLQuery: ";

/// Extracts the SQL from a model reply: drops everything from `SQLResult:` on,
/// a leading `SQLQuery:` label and surrounding code fences.
pub fn parse_sql_reply(reply: &str) -> String {
    let mut text = reply;
    if let Some(i) = text.find("SQLResult:") {
        text = &text[..i];
    }
    let mut text = text.trim();
    if let Some(i) = text.find("SQLQuery:") {
        text = text[i + "SQLQuery:".len()..].trim();
    }
    if let Some(inner) = text.strip_prefix("```") {
        let inner = inner.strip_prefix("sql").unwrap_or(inner);
        text = inner.split("```").next().unwrap_or(inner).trim();
    }
    text.to_string()
}

/// Question → SQL over one database.
///
/// **Interaction**: The `sql` subcommand builds one from `connect(url)` and a
/// `ChatOllama` (llama3.2, temperature 0).
pub struct SqlQueryChain {
    llm: Arc<dyn LlmClient>,
    db: Arc<dyn SqlDatabase>,
    prompt: ChatPromptTemplate,
    pub top_k: usize,
}

impl SqlQueryChain {
    pub fn new(llm: Arc<dyn LlmClient>, db: Arc<dyn SqlDatabase>) -> Result<Self, SqlError> {
        let prompt = ChatPromptTemplate::from_messages([("human", SQL_PROMPT)])
            .map_err(AgentError::from)?;
        Ok(Self {
            llm,
            db,
            prompt,
            top_k: DEFAULT_TOP_K,
        })
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// SQL text for `question`.
    pub async fn invoke(&self, question: &str) -> Result<String, SqlError> {
        let table_info = self.db.table_info(None).await?;
        let messages = self
            .prompt
            .format_messages(&vars([
                ("dialect", self.db.dialect().to_string()),
                ("top_k", self.top_k.to_string()),
                ("table_info", table_info),
                ("input", question.to_string()),
            ]))
            .map_err(AgentError::from)?;
        let reply = self.llm.invoke(&messages).await?;
        let sql = parse_sql_reply(&reply.content);
        tracing::info!(sql = %sql, "generated query");
        Ok(sql)
    }

    /// SQL for `question` plus its rendered result rows.
    pub async fn invoke_and_run(&self, question: &str) -> Result<(String, String), SqlError> {
        let sql = self.invoke(question).await?;
        let result = self.db.run(&sql).await?;
        Ok((sql, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Labels, fences and trailing result sections are stripped.
    #[test]
    fn parse_sql_reply_variants() {
        assert_eq!(parse_sql_reply("SELECT 1"), "SELECT 1");
        assert_eq!(
            parse_sql_reply("SQLQuery: SELECT name FROM city LIMIT 5\nSQLResult: [...]\nAnswer: x"),
            "SELECT name FROM city LIMIT 5"
        );
        assert_eq!(
            parse_sql_reply("```sql\nSELECT name FROM city;\n```"),
            "SELECT name FROM city;"
        );
        assert_eq!(
            parse_sql_reply("Here you go\nSQLQuery: ```SELECT 2```"),
            "SELECT 2"
        );
    }

    /// **Scenario**: The prompt carries dialect, schema and question; the reply's SQL is run.
    #[tokio::test]
    async fn invoke_and_run_over_sqlite() {
        use crate::llm::MockLlm;
        use crate::sql::SqliteDatabase;

        let db = SqliteDatabase::open(":memory:").unwrap();
        db.execute_batch(
            "CREATE TABLE city (name TEXT, population INTEGER);
             INSERT INTO city VALUES ('Tokyo', 37400068), ('Delhi', 28514000);",
        )
        .await
        .unwrap();
        let llm = Arc::new(MockLlm::with_replies([
            "SELECT name FROM city ORDER BY population DESC LIMIT 1\nSQLResult: ...",
        ]));
        let chain = SqlQueryChain::new(llm.clone(), Arc::new(db)).unwrap().with_top_k(2);
        let (sql, rows) = chain
            .invoke_and_run("Which city is the largest?")
            .await
            .unwrap();
        assert_eq!(sql, "SELECT name FROM city ORDER BY population DESC LIMIT 1");
        assert_eq!(rows, "[('Tokyo',)]");

        let prompt = llm.calls()[0][0].content().to_string();
        assert!(prompt.contains("You are a sqlite expert."));
        assert!(prompt.contains("at most 2 results"));
        assert!(prompt.contains("CREATE TABLE city"));
        assert!(prompt.ends_with("Question: Which city is the largest?\nSQLQuery: "));
    }
}
