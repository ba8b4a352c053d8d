//! File logging.
//!
//! Log records go to a daily-rolled file so they never interleave with
//! progress bars and prompts on the terminal. `RUST_LOG` overrides the
//! default `cloudfree=info` filter.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "cloudfree=info";

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Keeps the background log writer alive. Dropping it flushes pending
/// records.
#[must_use = "logging stops when the guard is dropped"]
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Platform data directory for logs, e.g. `~/.local/share/cloudfree/logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cloudfree")
        .join("logs")
}

/// Base name of the log file. The appender adds a date suffix.
pub fn default_log_file() -> &'static str {
    "cloudfree.log"
}

/// Install the global subscriber writing to `dir/file.<date>`.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(dir: &Path, file: &str) -> Result<LoggingGuard, LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let appender = tracing_appender::rolling::daily(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(LocalTime::new(Rfc3339))
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    Ok(LoggingGuard { _guard: guard })
}
