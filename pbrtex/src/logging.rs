//! Logging setup.
//!
//! Logs go to stderr and, optionally, to a file through a non-blocking
//! writer. `RUST_LOG` overrides the configured level. Building with the
//! `profiling` feature adds a Chrome trace layer writing `trace-*.json` into
//! the working directory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Invalid log file path {0}")]
    InvalidFile(PathBuf),

    #[error("Failed to install the log subscriber: {0}")]
    Init(String),
}

/// Keeps background log writers alive. Drop it last to flush pending output.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
    #[cfg(feature = "profiling")]
    _chrome: tracing_chrome::FlushGuard,
}

/// Filter for `level`, unless `RUST_LOG` is set.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        filter: level.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// # Arguments
///
/// * `level` - Default filter, e.g. `info` or `pbrtex=debug`
/// * `file` - Optional log file, appended to
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(level)?;

    let (file_layer, file_guard) = match file {
        Some(path) => {
            let name = path
                .file_name()
                .ok_or_else(|| LoggingError::InvalidFile(path.to_path_buf()))?;
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(directory, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer);

    #[cfg(feature = "profiling")]
    let (registry, chrome_guard) = {
        let (layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
            .include_args(true)
            .build();
        (registry.with(layer), guard)
    };

    registry
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard {
        _file: file_guard,
        #[cfg(feature = "profiling")]
        _chrome: chrome_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_levels() {
        for level in crate::config::LOG_LEVELS {
            assert!(build_filter(level).is_ok());
        }
        assert!(build_filter("pbrtex=debug,wgpu=warn").is_ok());
    }

    #[test]
    fn test_log_file_needs_a_name() {
        let result = init_logging("info", Some(Path::new("/")));
        assert!(matches!(result, Err(LoggingError::InvalidFile(_))));
    }
}
