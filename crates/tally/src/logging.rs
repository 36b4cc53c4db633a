//! Logging configuration for tally.
//!
//! This module provides initialization and configuration for the tracing-based
//! logging system used throughout tally. While the counter screen owns the
//! terminal, log lines go to a file instead of stderr.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// Normal output level (info and above).
    #[default]
    Normal,
    /// Verbose output (debug and above).
    Verbose,
    /// Very verbose output (trace level).
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Initialize the logging system.
///
/// This should be called once at application startup. The logging level can be
/// controlled via:
/// 1. The `verbosity` parameter
/// 2. The `RUST_LOG` environment variable (takes precedence)
///
/// With `log_file` set, output is appended to that file (parent directories
/// are created). If the file cannot be opened, output falls back to stderr.
///
/// # Examples
///
/// ```no_run
/// use tally::{init_logging, logging::Verbosity};
///
/// // Log to stderr
/// init_logging(Verbosity::Normal, None);
///
/// // Log to a file while the screen is up
/// init_logging(Verbosity::Verbose, Some(std::path::Path::new("/tmp/tally.log")));
/// ```
pub fn init_logging(verbosity: Verbosity, log_file: Option<&Path>) {
    let default_filter = format!("tally={}", verbosity.to_level_filter());

    // Allow RUST_LOG to override
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let file = log_file.and_then(|path| open_log_file(path).ok());
    let (file_layer, stderr_layer) = match file {
        Some(file) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        None => (
            None,
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer);

    // Install the subscriber (ignore error if already set)
    let _ = subscriber.try_init();
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize logging for tests.
///
/// Only warnings and errors are logged, through the test writer.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_verbosity_default() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_open_log_file_creates_parents() {
        let root = std::env::temp_dir().join(format!("tally_log_test_{}", std::process::id()));
        let path = root.join("logs/tally.log");
        let _ = std::fs::remove_dir_all(&root);

        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_init_logging_does_not_panic() {
        // A subscriber may already be installed by another test; that is ignored.
        init_logging(Verbosity::Normal, None);
        init_logging(Verbosity::Quiet, None);
        init_logging(Verbosity::Trace, None);
    }

    #[test]
    fn test_init_logging_with_unwritable_file_falls_back() {
        let path = Path::new("/dev/null/nested/tally.log");
        assert!(open_log_file(path).is_err());

        init_logging(Verbosity::Verbose, Some(path));

        assert!(tracing::dispatcher::has_been_set());
        assert!(!path.exists());
    }

    #[test]
    fn test_init_test_logging_does_not_panic() {
        init_test_logging();
    }
}
