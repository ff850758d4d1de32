//! `recipes` binary: run one recipe from the command line.
//!
//! Subcommands: `chat`, `translate`, `tool-call`, `search ddg|serper`, `web-agent`, `review`,
//! `github`, `sql`, `db-check`, `tokens`, `embed`, `counter`.

mod commands;
mod logging;
mod repl;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recipes::agent::chat::{DEFAULT_QUESTION, DEFAULT_SYSTEM};
use recipes::agent::github::DEFAULT_MAX_STEPS;
use recipes::agent::review::DEFAULT_REVIEW_ITERATIONS;
use recipes::agent::web_search::DEFAULT_MAX_ITERATIONS;
use recipes::sql::DEFAULT_TOP_K;
use recipes::tokens::DEFAULT_ENCODING;
use recipes::tools::{OutputFormat, SearchSource};

use commands::Context;

const TOOL_CALL_PROMPT: &str = "Could you validate user 123? They previously lived at \
    123 Fake St in Boston MA and 234 Pretend Boulevard in Houston TX.";
const WEB_AGENT_QUESTION: &str = "What are the latest news about AI? Summarize them";
const REVIEW_REQUEST: &str =
    "Write a 1,000-word blog post about the effects of fasting on the human body.";
const SQL_QUESTION: &str = "Return the top 5 cities (along with their populations \
    and countries) with the highest population.";
const SAMPLE_TEXT: &str = "Hello, how are you?";

#[derive(Parser, Debug)]
#[command(name = "recipes")]
#[command(about = "Recipes: local-LLM chat, tools, web search, SQL and small agent graphs")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Model name (each recipe has its own default)
    #[arg(long, global = true, value_name = "NAME")]
    model: Option<String>,

    /// Sampling temperature (each recipe has its own default)
    #[arg(long, global = true, value_name = "T")]
    temperature: Option<f32>,

    /// Verbose: log node enter/exit and HTTP calls (recipes=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask one question under a system prompt (phi4, 0.5)
    Chat(ChatArgs),
    /// Translate text with the translation prompt chain
    Translate(TranslateArgs),
    /// Native tool calling with the demo user tools (llama3.2, 0.0)
    ToolCall(ToolCallArgs),
    /// One-shot web search
    Search(SearchArgs),
    /// Web-search agent loop; writes the answer to output.md (phi4:latest, 0.2)
    WebAgent(WebAgentArgs),
    /// Generate / fact-check loop; writes the content to Untitled.md
    Review(ReviewArgs),
    /// GitHub agent graph over the repository in GITHUB_REPOSITORY
    Github(GitHubArgs),
    /// Turn a question into SQL for DATABASE_URL
    Sql(SqlArgs),
    /// Check that DATABASE_URL accepts connections
    DbCheck(DbArgs),
    /// Count BPE tokens
    Tokens(TokensArgs),
    /// Embed text and print a preview of the vector
    Embed(EmbedArgs),
    /// Checkpointed counter graph with a REPL
    Counter(CounterArgs),
}

#[derive(clap::Args, Debug)]
pub struct ChatArgs {
    /// User message
    #[arg(default_value = DEFAULT_QUESTION)]
    pub question: String,
    #[arg(long, default_value = DEFAULT_SYSTEM)]
    pub system: String,
}

#[derive(clap::Args, Debug)]
pub struct TranslateArgs {
    #[arg(default_value = "how are you?")]
    pub text: String,
    #[arg(long, default_value = "English")]
    pub from: String,
    #[arg(long, default_value = "Bengali")]
    pub to: String,
}

#[derive(clap::Args, Debug)]
pub struct ToolCallArgs {
    #[arg(default_value = TOOL_CALL_PROMPT)]
    pub prompt: String,
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    #[command(subcommand)]
    engine: SearchEngine,
}

#[derive(Subcommand, Debug)]
enum SearchEngine {
    /// DuckDuckGo text or news search
    Ddg(DdgArgs),
    /// Google search through Serper (needs SERPER_API_KEY)
    Serper {
        query: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct DdgArgs {
    pub query: String,
    /// text or news
    #[arg(long, default_value = "text")]
    pub source: SearchSource,
    /// string or list (JSON)
    #[arg(long, default_value = "string")]
    pub output: OutputFormat,
    #[arg(long, value_name = "N")]
    pub max_results: Option<usize>,
    /// Region code, e.g. us-en
    #[arg(long)]
    pub region: Option<String>,
    /// Time limit: d, w, m or y
    #[arg(long)]
    pub time: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct WebAgentArgs {
    #[arg(default_value = WEB_AGENT_QUESTION)]
    pub question: String,
    #[arg(long, default_value = "output.md")]
    pub output: PathBuf,
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u32,
}

#[derive(clap::Args, Debug)]
pub struct ReviewArgs {
    #[arg(default_value = REVIEW_REQUEST)]
    pub request: String,
    /// Search the web between drafting and fact-checking
    #[arg(long)]
    pub research: bool,
    #[arg(long, default_value = "Untitled.md")]
    pub output: PathBuf,
    #[arg(long, default_value_t = DEFAULT_REVIEW_ITERATIONS)]
    pub max_iterations: u32,
}

#[derive(clap::Args, Debug)]
pub struct GitHubArgs {
    /// Request; defaults to the file overview of the repository
    pub message: Option<String>,
    /// owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,
    /// Defaults to main
    #[arg(long, env = "GITHUB_BRANCH")]
    pub branch: Option<String>,
    /// Use native tool calling instead of the text tool menu
    #[arg(long)]
    pub structured: bool,
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    pub max_steps: u32,
}

#[derive(clap::Args, Debug)]
pub struct DbArgs {
    /// sqlite:path or postgres://…
    #[arg(long, value_name = "URL", env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SqlArgs {
    #[arg(default_value = SQL_QUESTION)]
    pub question: String,
    #[command(flatten)]
    pub db: DbArgs,
    /// Run the generated query and print its rows
    #[arg(long)]
    pub execute: bool,
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,
}

#[derive(clap::Args, Debug)]
pub struct TokensArgs {
    #[arg(default_value = SAMPLE_TEXT)]
    pub text: String,
    /// gpt2, r50k_base, p50k_base, cl100k_base or o200k_base
    #[arg(long, default_value = DEFAULT_ENCODING)]
    pub encoding: String,
}

#[derive(clap::Args, Debug)]
pub struct EmbedArgs {
    #[arg(default_value = SAMPLE_TEXT)]
    pub text: String,
}

#[derive(clap::Args, Debug)]
pub struct CounterArgs {
    /// Keep checkpoints in SQLite (default file: checkpoints.sqlite); in memory otherwise
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = recipes::agent::counter::DEFAULT_CHECKPOINT_DB
    )]
    pub db: Option<PathBuf>,
    /// Write the graph as Mermaid text (default file: diagram_simple_graph.mmd)
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = "diagram_simple_graph.mmd"
    )]
    pub diagram: Option<PathBuf>,
}

async fn dispatch(cmd: Command, ctx: &Context) -> commands::CliResult {
    match cmd {
        Command::Chat(a) => commands::run_chat(ctx, a).await,
        Command::Translate(a) => commands::run_translate(ctx, a).await,
        Command::ToolCall(a) => commands::run_tool_call(ctx, a).await,
        Command::Search(s) => match s.engine {
            SearchEngine::Ddg(a) => commands::run_search_ddg(a).await,
            SearchEngine::Serper { query } => commands::run_search_serper(ctx, &query).await,
        },
        Command::WebAgent(a) => commands::run_web_agent(ctx, a).await,
        Command::Review(a) => commands::run_review_loop(ctx, a).await,
        Command::Github(a) => commands::run_github(ctx, a).await,
        Command::Sql(a) => commands::run_sql(ctx, a).await,
        Command::DbCheck(a) => commands::run_db_check(ctx, a).await,
        Command::Tokens(a) => commands::run_tokens(a),
        Command::Embed(a) => commands::run_embed(ctx, a).await,
        Command::Counter(a) => commands::run_counter(a).await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loaded = config::load_and_apply(config::APP_NAME, None);
    let args = Args::parse();
    let log_guard = logging::init(args.verbose)?;
    if let Err(e) = loaded {
        tracing::warn!(error = %e, "config not loaded");
    }

    let ctx = Context {
        model: args.model,
        temperature: args.temperature,
        settings: config::Settings::from_env(),
    };
    if let Err(e) = dispatch(args.cmd, &ctx).await {
        eprintln!("error: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = parse(&["recipes", "chat", "hi", "--model", "llama3.2", "--temperature", "0.1", "-v"]);
        assert_eq!(args.model.as_deref(), Some("llama3.2"));
        assert_eq!(args.temperature, Some(0.1));
        assert!(args.verbose);
        match args.cmd {
            Command::Chat(a) => {
                assert_eq!(a.question, "hi");
                assert_eq!(a.system, DEFAULT_SYSTEM);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn web_agent_defaults() {
        match parse(&["recipes", "web-agent"]).cmd {
            Command::WebAgent(a) => {
                assert_eq!(a.question, WEB_AGENT_QUESTION);
                assert_eq!(a.output, PathBuf::from("output.md"));
                assert_eq!(a.max_iterations, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn review_research_flag_and_output() {
        match parse(&["recipes", "review", "--research"]).cmd {
            Command::Review(a) => {
                assert!(a.research);
                assert_eq!(a.output, PathBuf::from("Untitled.md"));
                assert_eq!(a.request, REVIEW_REQUEST);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_ddg_parses_source_and_output() {
        let args = parse(&["recipes", "search", "ddg", "rust", "--source", "news", "--output", "list", "--max-results", "2"]);
        match args.cmd {
            Command::Search(SearchArgs { engine: SearchEngine::Ddg(a) }) => {
                assert_eq!(a.query, "rust");
                assert_eq!(a.source, SearchSource::News);
                assert_eq!(a.output, OutputFormat::List);
                assert_eq!(a.max_results, Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_ddg_rejects_unknown_source() {
        assert!(Args::try_parse_from(["recipes", "search", "ddg", "q", "--source", "images"]).is_err());
    }

    #[test]
    fn counter_db_flag_without_value_uses_default_file() {
        match parse(&["recipes", "counter", "--db"]).cmd {
            Command::Counter(a) => {
                assert_eq!(a.db, Some(PathBuf::from("checkpoints.sqlite")));
                assert_eq!(a.diagram, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse(&["recipes", "counter", "--db", "c.sqlite", "--diagram"]).cmd {
            Command::Counter(a) => {
                assert_eq!(a.db, Some(PathBuf::from("c.sqlite")));
                assert_eq!(a.diagram, Some(PathBuf::from("diagram_simple_graph.mmd")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sql_execute_and_database_url() {
        match parse(&["recipes", "sql", "--execute", "--database-url", "sqlite:city.db"]).cmd {
            Command::Sql(a) => {
                assert!(a.execute);
                assert_eq!(a.db.database_url.as_deref(), Some("sqlite:city.db"));
                assert_eq!(a.top_k, DEFAULT_TOP_K);
                assert_eq!(a.question, SQL_QUESTION);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn github_structured_and_tokens_defaults() {
        match parse(&["recipes", "github", "--structured", "list open issues"]).cmd {
            Command::Github(a) => {
                assert!(a.structured);
                assert_eq!(a.message.as_deref(), Some("list open issues"));
                assert_eq!(a.max_steps, DEFAULT_MAX_STEPS);
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse(&["recipes", "tokens"]).cmd {
            Command::Tokens(a) => {
                assert_eq!(a.text, SAMPLE_TEXT);
                assert_eq!(a.encoding, "gpt2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn github_repository_from_env_and_flag() {
        std::env::set_var("GITHUB_REPOSITORY", "octo/from-env");
        let from_env = parse(&["recipes", "github"]);
        let from_flag = parse(&["recipes", "github", "--repository", "octo/from-flag"]);
        std::env::remove_var("GITHUB_REPOSITORY");
        match from_env.cmd {
            Command::Github(a) => assert_eq!(a.repository.as_deref(), Some("octo/from-env")),
            other => panic!("unexpected {other:?}"),
        }
        match from_flag.cmd {
            Command::Github(a) => assert_eq!(a.repository.as_deref(), Some("octo/from-flag")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
