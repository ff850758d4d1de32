//! Checkpointed counter: `START → printer → END`, saved per thread.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, Node, StateGraph, END, START};
use crate::memory::{Checkpointer, JsonSerializer, MemorySaver, RunnableConfig, SqliteSaver};

pub const NODE_PRINTER: &str = "printer";
pub const COUNTER_THREAD: &str = "1";
pub const DEFAULT_CHECKPOINT_DB: &str = "checkpoints.sqlite";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub count: i64,
}

pub type Printer = Arc<dyn Fn(&str) + Send + Sync>;

/// Prints `Count: n`, then increments.
pub struct PrinterNode {
    out: Printer,
}

impl PrinterNode {
    /// Prints to stdout.
    pub fn new() -> Self {
        Self::with_printer(Arc::new(|line: &str| println!("{line}")))
    }

    pub fn with_printer(out: Printer) -> Self {
        Self { out }
    }
}

impl Default for PrinterNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node<CounterState> for PrinterNode {
    fn id(&self) -> &str {
        NODE_PRINTER
    }

    async fn run(&self, state: CounterState) -> Result<(CounterState, Next), AgentError> {
        (self.out)(&format!("Count: {}", state.count));
        Ok((
            CounterState {
                count: state.count + 1,
            },
            Next::Continue,
        ))
    }
}

/// Where the counter keeps its checkpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CounterStore {
    Memory,
    Sqlite(std::path::PathBuf),
}

pub fn build_counter_graph(
    printer: PrinterNode,
    checkpointer: Arc<dyn Checkpointer<CounterState>>,
) -> Result<CompiledStateGraph<CounterState>, CompilationError> {
    let mut graph = StateGraph::<CounterState>::new();
    graph
        .add_node(NODE_PRINTER, Arc::new(printer))
        .add_edge(START, NODE_PRINTER)
        .add_edge(NODE_PRINTER, END);
    graph.compile_with_checkpointer(checkpointer)
}

pub fn counter_checkpointer(
    store: &CounterStore,
) -> Result<Arc<dyn Checkpointer<CounterState>>, AgentError> {
    let checkpointer: Arc<dyn Checkpointer<CounterState>> = match store {
        CounterStore::Memory => Arc::new(MemorySaver::new()),
        CounterStore::Sqlite(path) => Arc::new(open_sqlite(path)?),
    };
    Ok(checkpointer)
}

fn open_sqlite(path: &Path) -> Result<SqliteSaver<CounterState>, AgentError> {
    Ok(SqliteSaver::new(path, Arc::new(JsonSerializer))?)
}

/// One counter thread: each `step` resumes from the saved count.
pub struct CounterSession {
    graph: CompiledStateGraph<CounterState>,
    config: RunnableConfig,
}

impl CounterSession {
    pub fn new(graph: CompiledStateGraph<CounterState>) -> Self {
        Self {
            graph,
            config: RunnableConfig::for_thread(COUNTER_THREAD),
        }
    }

    pub fn graph(&self) -> &CompiledStateGraph<CounterState> {
        &self.graph
    }

    /// Runs once from the saved state, or from `{count: 0}` on a fresh thread.
    pub async fn step(&self) -> Result<CounterState, AgentError> {
        let state = self.graph.get_state(&self.config).await?.unwrap_or_default();
        self.graph.invoke(state, Some(self.config.clone())).await
    }
}

/// REPL lines that end the session.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit" | "q")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command(" Q "));
        assert!(is_exit_command("QUIT"));
        assert!(!is_exit_command(""));
        assert!(!is_exit_command("again"));
    }

    /// **Scenario**: Each step prints the saved count and saves count + 1.
    #[tokio::test]
    async fn session_resumes_from_memory_checkpoint() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let printer = PrinterNode::with_printer(Arc::new(move |l: &str| {
            sink.lock().unwrap().push(l.to_string());
        }));
        let cp = counter_checkpointer(&CounterStore::Memory).unwrap();
        let session = CounterSession::new(build_counter_graph(printer, cp).unwrap());
        assert_eq!(session.step().await.unwrap().count, 1);
        assert_eq!(session.step().await.unwrap().count, 2);
        assert_eq!(*lines.lock().unwrap(), vec!["Count: 0", "Count: 1"]);
    }
}
