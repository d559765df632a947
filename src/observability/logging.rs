//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber before settings are loaded
//! - Mirror log events into a plain-text log file next to the console
//! - Switch to the configured log level once settings are available
//!
//! # Design Decisions
//! - `RUST_LOG` always wins over the settings file
//! - The filter sits behind a reload layer so the level can change after
//!   startup without rebuilding the subscriber
//! - A log file that cannot be opened is reported and skipped; console
//!   logging still starts

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::reload;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry};

use crate::settings::LogLevel;

/// The log file could not be opened.
#[derive(Debug, Error)]
pub enum LogFileError {
    #[error("{0} does not name a file")]
    NoFileName(PathBuf),

    #[error(transparent)]
    Init(#[from] InitError),
}

/// Open `path` for appending, creating its directory when needed.
pub fn file_appender(path: &Path) -> Result<RollingFileAppender, LogFileError> {
    let name = path
        .file_name()
        .ok_or_else(|| LogFileError::NoFileName(path.to_path_buf()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    Ok(RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy().into_owned())
        .build(dir)?)
}

/// Handle to the installed log filter.
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
    current: LevelFilter,
}

/// Install the global subscriber with `default` as the starting level,
/// logging to stdout and, when given, to `log_file`.
///
/// `RUST_LOG`, when set, replaces the default and pins the filter.
pub fn init_logging(default: LogLevel, log_file: Option<&Path>) -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (level_filter(default.to_level_filter()), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let (file_layer, file_error) = match log_file.map(|path| (path, file_appender(path))) {
        Some((_, Ok(appender))) => (
            Some(fmt::layer().with_ansi(false).with_writer(appender)),
            None,
        ),
        Some((path, Err(e))) => (None, Some((path, e))),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some((path, e)) = file_error {
        tracing::warn!(path = %path.display(), error = %e, "Unable to open log file, logging to console only");
    }

    LogHandle {
        handle,
        from_env,
        current: LevelFilter::current(),
    }
}

fn level_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::default().add_directive(level.into())
}

impl LogHandle {
    /// Switch to `level` unless `RUST_LOG` pinned the filter.
    ///
    /// Returns true when the level changed.
    pub fn apply(&mut self, level: LogLevel) -> bool {
        let target = level.to_level_filter();
        if self.from_env || target == self.current {
            return false;
        }

        tracing::info!(from = %self.current, to = %level, "Switching log level");
        match self.handle.reload(level_filter(target)) {
            Ok(()) => {
                self.current = target;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to switch log level");
                false
            }
        }
    }

    pub fn current(&self) -> LevelFilter {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_appender_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("shinogramma.log");

        let mut appender = file_appender(&path).unwrap();
        appender.write_all(b"started\n").unwrap();
        appender.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "started\n");
    }

    #[test]
    fn test_file_appender_needs_file_name() {
        assert!(matches!(
            file_appender(Path::new("/")),
            Err(LogFileError::NoFileName(_))
        ));
    }
}
