//! # Logging Utilities
//!
//! Logging setup for the aplreg tools, built on `tracing`.
//!
//! Diagnostics always go to stderr so that register tables and JSON written
//! to stdout stay machine-readable. A second, non-blocking file sink can be
//! added through `APLREG_LOG_FILE`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aplreg_utils::init_logging;
//!
//! // Keep the guard alive for as long as logs should be written
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Session started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=aplreg_core=trace`)
//! - `APLREG_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `APLREG_LOG_FILE`: Optional path of a daily-rotated log file
//!
//! An explicit level passed to [`init_logging_with_level`] wins over `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "APLREG_LOG_FORMAT";

/// Environment variable naming the optional log file
pub const LOG_FILE_ENV: &str = "APLREG_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat
{
    /// Human-readable lines (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    /// Default
    Info,
    Debug,
    /// Most verbose; logs every register read
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Keeps the file sink flushing
///
/// Dropping the handle flushes and stops the background writer, so hold it
/// until the program exits. It is empty when no log file was configured.
#[derive(Debug, Default)]
#[must_use = "dropping the handle stops file logging"]
pub struct LoggingHandle
{
    guard: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingHandle
{
    /// The configured log file, if any
    pub fn log_file(&self) -> Option<&Path>
    {
        self.log_file.as_deref()
    }

    pub fn has_file_sink(&self) -> bool
    {
        self.guard.is_some()
    }
}

/// Initialize logging from the environment
///
/// Uses `RUST_LOG` for filtering (default `warn`), `APLREG_LOG_FORMAT` for
/// the format and `APLREG_LOG_FILE` for the optional file sink.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed or
/// `APLREG_LOG_FORMAT` holds an unknown format.
pub fn init_logging() -> Result<LoggingHandle, LoggingError>
{
    let format = format_from_env()?;
    install(|| build_filter(None), format, file_from_env())
}

/// Initialize logging with an explicit level
///
/// `level` of `None` falls back to `RUST_LOG`, then to `warn`.
///
/// ## Example
///
/// ```rust,no_run
/// use aplreg_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(Some(LogLevel::Debug), LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed or the log
/// file's directory cannot be created.
pub fn init_logging_with_level(level: Option<LogLevel>, format: LogFormat) -> Result<LoggingHandle, LoggingError>
{
    install(|| build_filter(level), format, file_from_env())
}

fn format_from_env() -> Result<LogFormat, LoggingError>
{
    match env::var(LOG_FORMAT_ENV) {
        Ok(value) if !value.trim().is_empty() => value.trim().parse(),
        _ => Ok(LogFormat::default()),
    }
}

fn file_from_env() -> Option<PathBuf>
{
    env::var_os(LOG_FILE_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Filter priority: explicit level, then `RUST_LOG`, then `warn`
fn build_filter(level: Option<LogLevel>) -> EnvFilter
{
    if let Some(level) = level {
        return EnvFilter::new(Level::from(level).to_string());
    }
    match env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string())),
        Err(_) => EnvFilter::new(Level::WARN.to_string()),
    }
}

/// Split a log file path into the appender's directory and file prefix
fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError>
{
    let Some(file_name) = path.file_name() else {
        return Err(LoggingError::FileError(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} does not name a file", path.display()),
        )));
    };
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, PathBuf::from(file_name)))
}

fn install<F>(filter: F, format: LogFormat, log_file: Option<PathBuf>) -> Result<LoggingHandle, LoggingError>
where
    F: Fn() -> EnvFilter,
{
    let mut handle = LoggingHandle::default();

    let file_writer = match &log_file {
        Some(path) => {
            let (directory, prefix) = split_log_path(path)?;
            std::fs::create_dir_all(&directory)?;
            let appender = tracing_appender::rolling::daily(directory, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            handle.guard = Some(guard);
            handle.log_file = log_file.clone();
            Some(writer)
        }
        None => None,
    };

    let result = match format {
        LogFormat::Pretty => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(io::IsTerminal::is_terminal(&io::stderr()))
                .with_writer(io::stderr)
                .with_filter(filter());

            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_filter(filter())
            });

            Registry::default().with(console_layer).with(file_layer).try_init()
        }
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stderr)
                .with_filter(filter());

            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(filter())
            });

            Registry::default().with(console_layer).with(file_layer).try_init()
        }
    };

    result.map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
    Ok(handle)
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
