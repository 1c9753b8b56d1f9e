//! File-backed tracing setup.
//!
//! Stdout belongs to the progress display, so logs always go to a file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, StackwatchError};

/// Builds the filter: `RUST_LOG` wins when set, otherwise `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| StackwatchError::Config(format!("Invalid log level '{}': {}", level, e)))
}

/// Installs the global subscriber writing to `log_file`. Keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init(log_file: &Path, level: &str) -> Result<WorkerGuard> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = log_file
        .file_name()
        .ok_or_else(|| StackwatchError::Config(format!("Invalid log file: {}", log_file.display())))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level)?)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| StackwatchError::Config(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}
