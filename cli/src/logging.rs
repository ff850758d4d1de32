//! Logging initialization: stderr always, plus a daily log file when `RECIPES_LOG_DIR` is set.
//!
//! Reads `RUST_LOG` for the level filter (default `warn`). `--verbose` adds `recipes=debug`
//! so node enter/exit and HTTP calls show up. stdout stays reserved for recipe output.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const DEFAULT_FILTER: &str = "warn";
pub const LOG_DIR_ENV: &str = "RECIPES_LOG_DIR";
const LOG_FILE_PREFIX: &str = "recipes.log";

/// Filter directives from `RUST_LOG` (blank counts as unset) and the verbose flag.
pub fn filter_spec(rust_log: Option<String>, verbose: bool) -> String {
    let mut spec = rust_log
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());
    if verbose {
        spec.push_str(",recipes=debug");
    }
    spec
}

fn env_filter(verbose: bool) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    let spec = filter_spec(std::env::var("RUST_LOG").ok(), verbose);
    Ok(EnvFilter::try_new(spec)?)
}

/// Installs the global subscriber. Keep the returned guard alive until exit so the
/// file writer flushes.
pub fn init(verbose: bool) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter(verbose)?);

    match std::env::var_os(LOG_DIR_ENV).filter(|d| !d.is_empty()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter(verbose)?);
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .try_init()?;
            tracing::debug!(dir = ?dir, "logging to file");
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).try_init()?;
            Ok(None)
        }
    }
}
