//! Logging setup for one invocation.
//!
//! Every event goes to the console (stdout, or stderr when stdout carries
//! machine-readable output) and, when a log file is configured, is appended to
//! that file through a non-blocking writer. The returned [`LoggingGuard`]
//! flushes the file when dropped, so keep it alive for the whole run.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "sync_labels.log";

#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Log at `debug` instead of `info`. `RUST_LOG` overrides both.
    pub verbose: bool,
    /// File that receives a copy of every log line.
    pub log_file: Option<PathBuf>,
    /// Send console output to stderr instead of stdout.
    pub console_stderr: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            console_stderr: false,
        }
    }
}

/// Keeps the file writer alive. Dropping it flushes pending lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Build the subscriber without installing it.
pub fn subscriber(
    settings: &LogSettings,
) -> Result<(impl tracing::Subscriber + Send + Sync + 'static, LoggingGuard)> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if settings.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let (file_layer, file_guard) = match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console = if settings.console_stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(console))
        .with(file_layer);

    Ok((subscriber, LoggingGuard { _file: file_guard }))
}

/// Install the global subscriber for this process.
///
/// # Errors
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init(settings: &LogSettings) -> Result<LoggingGuard> {
    let (subscriber, guard) = subscriber(settings)?;
    subscriber
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(guard)
}
