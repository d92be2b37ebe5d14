//! # Logging Utilities
//!
//! Logging infrastructure for the symbolizer tools using `tracing`.
//!
//! This module provides structured logging with support for:
//! - Pretty (development) and JSON (machine) output formats
//! - Environment variable configuration
//! - An explicit level override from the command line
//! - Optional file output
//!
//! Console output always goes to **stderr**. Stdout belongs to the tools'
//! actual output (symbolized traces, resolved addresses).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symbolizer_utils::init_logging;
//!
//! // Reads RUST_LOG, SYMBOLIZER_LOG_FORMAT and SYMBOLIZER_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`,
//!   `RUST_LOG=symbolizer_core=debug,symbolizer::engine=trace`)
//! - `SYMBOLIZER_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `SYMBOLIZER_LOG_FILE`: Optional log file; rotated daily, a date suffix is
//!   appended to the name
//!
//! ## Guards
//!
//! File output goes through a background writer. Every initializer returns a
//! [`LogGuard`]; keep it alive until the program exits or buffered lines are
//! lost.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fmt as std_fmt, fs, io};

use chrono::{NaiveDate, Utc};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "SYMBOLIZER_LOG_FORMAT";

/// Environment variable naming an additional log file.
pub const LOG_FILE_ENV: &str = "SYMBOLIZER_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// JSON format, one object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

impl LogFormat
{
    /// Format selected by `SYMBOLIZER_LOG_FORMAT`, `Pretty` when unset.
    ///
    /// ## Errors
    ///
    /// `InvalidFormat` when the variable holds an unknown format.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        match env::var(LOG_FORMAT_ENV) {
            Ok(value) => LogFormat::from_str(&value).map_err(LoggingError::InvalidFormat),
            Err(_) => Ok(LogFormat::default()),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
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
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

impl std_fmt::Display for LogLevel
{
    fn fmt(&self, f: &mut std_fmt::Formatter<'_>) -> std_fmt::Result
    {
        write!(f, "{}", Level::from(*self))
    }
}

/// Keeps the background log file writer alive
///
/// Dropping it flushes and stops file logging. Console logging is unaffected.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LogGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (default: `info`)
/// - `SYMBOLIZER_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `SYMBOLIZER_LOG_FILE`: Optional path to a log file
///
/// ## Example
///
/// ```rust,no_run
/// use symbolizer_utils::init_logging;
///
/// let _guard = init_logging().expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `SYMBOLIZER_LOG_FORMAT` holds an unknown format
pub fn init_logging() -> Result<LogGuard, LoggingError>
{
    let format = LogFormat::from_env()?;
    init_logging_internal(format, None)
}

/// Initialize logging with explicit level and format
///
/// The level replaces `RUST_LOG`. `SYMBOLIZER_LOG_FILE` is still honored.
///
/// ## Example
///
/// ```rust,no_run
/// use symbolizer_utils::{init_logging_with_level, LogFormat, LogLevel};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LogGuard, LoggingError>
{
    init_logging_internal(format, Some(level.into()))
}

/// Initialize file-only logging (nothing on the console)
///
/// Used for long trace replays where stderr should only carry the final
/// summary. The log file is `~/.symbolizer/YYYY-MM-DD-symbolizer.log`, or the
/// same name in the system temp directory when there is no home directory.
///
/// ## Arguments
///
/// * `level` - Optional log level. If `None`, uses `RUST_LOG` or defaults to `INFO`.
///
/// ## Example
///
/// ```rust,no_run
/// use symbolizer_utils::{init_logging_to_file, LogLevel};
///
/// let (path, _guard) = init_logging_to_file(Some(LogLevel::Debug)).expect("Failed to initialize logging");
/// eprintln!("logging to {}", path.display());
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log directory
/// cannot be created.
pub fn init_logging_to_file(level: Option<LogLevel>) -> Result<(PathBuf, LogGuard), LoggingError>
{
    let dir = default_log_dir();
    fs::create_dir_all(&dir)?;
    let log_file = dir.join(dated_file_name(Utc::now().date_naive()));

    let filter = env_filter(level.map(Into::into));
    let appender = tracing_appender::rolling::never(parent_or_cwd(&log_file), file_name(&log_file));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layers = vec![fmt_layer(LogFormat::from_env()?, writer, false, filter)];
    install(layers)?;

    Ok((log_file, LogGuard { _file: Some(guard) }))
}

fn init_logging_internal(format: LogFormat, explicit_level: Option<Level>) -> Result<LogGuard, LoggingError>
{
    let mut layers = vec![fmt_layer(format, io::stderr, true, env_filter(explicit_level))];

    let mut guard = None;
    if let Some(file_path) = env::var_os(LOG_FILE_ENV).map(PathBuf::from) {
        let appender = tracing_appender::rolling::daily(parent_or_cwd(&file_path), file_name(&file_path));
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt_layer(format, writer, false, env_filter(explicit_level)));
        guard = Some(file_guard);
    }

    install(layers)?;
    Ok(LogGuard { _file: guard })
}

fn install(layers: Vec<BoxedLayer>) -> Result<(), LoggingError>
{
    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))
}

/// Build the filter for one layer
///
/// Priority:
/// 1. An explicit level (from the `--log-level` CLI flag)
/// 2. `RUST_LOG`, including per-module directives
/// 3. `info`
fn env_filter(explicit_level: Option<Level>) -> EnvFilter
{
    match explicit_level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
    }
}

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn default_log_dir() -> PathBuf
{
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".symbolizer"))
        .unwrap_or_else(env::temp_dir)
}

fn dated_file_name(date: NaiveDate) -> String
{
    format!("{}-symbolizer.log", date.format("%Y-%m-%d"))
}

fn parent_or_cwd(path: &Path) -> &Path
{
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn file_name(path: &Path) -> &OsStr
{
    path.file_name().unwrap_or_else(|| OsStr::new("symbolizer.log"))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Failed to initialize logging (usually: already initialized)
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("PROD").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("invalid").is_err());
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warn").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_log_level_display()
    {
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
    }

    #[test]
    fn test_dated_file_name()
    {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(dated_file_name(date), "2026-10-16-symbolizer.log");
    }

    #[test]
    fn test_parent_or_cwd()
    {
        assert_eq!(parent_or_cwd(Path::new("logs/run.log")), Path::new("logs"));
        assert_eq!(parent_or_cwd(Path::new("run.log")), Path::new("."));
        assert_eq!(file_name(Path::new("logs/run.log")), "run.log");
    }
}
