//! Subscriber setup for the `depdiff` binary
//!
//! Human-readable output goes to stderr so the report on stdout stays clean.
//! With a log file, JSON lines are written to [`log_path`] through a
//! non-blocking appender instead.

use anyhow::anyhow;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_LOG_FILTER, LOG_FILE_NAME, LOG_FILTER_ENV, data_dir, log_path};

/// Builds the filter from an explicit directive, else [`LOG_FILTER_ENV`], else the default.
///
/// An invalid explicit directive is an error; an invalid environment value falls
/// back to the default.
pub fn build_filter(level: Option<&str>) -> anyhow::Result<EnvFilter> {
    match level {
        Some(directive) => Ok(EnvFilter::try_new(directive)?),
        None => Ok(EnvFilter::try_from_env(LOG_FILTER_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
    }
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held until exit.
pub fn init(level: Option<&str>, to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = build_filter(level)?;

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;
        return Ok(None);
    }

    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, LOG_FILE_NAME));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    tracing::debug!("Logging to {:?}", log_path());
    Ok(Some(guard))
}
