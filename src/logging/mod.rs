//! # Logging
//!
//! Structured logging setup. Console output goes to stderr so it does not
//! interleave with result tables on stdout; file output replaces it when
//! enabled.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (default: WARN, the shell is interactive)
    pub level: Level,
    /// Whether to log to the console
    pub console: bool,
    /// Whether to log to a file
    pub file: bool,
    /// Log file path (default: `logs/infotron.log`)
    pub file_path: PathBuf,
    /// Whether to include thread IDs
    pub include_thread_ids: bool,
    /// Whether to include file and line numbers
    pub include_file_line: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            console: true,
            file: false,
            file_path: PathBuf::from("logs/infotron.log"),
            include_thread_ids: false,
            include_file_line: false,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: bool) -> Self {
        self.file = file;
        self
    }

    #[must_use]
    pub fn with_file_path(mut self, path: PathBuf) -> Self {
        self.file_path = path;
        self
    }

    #[must_use]
    pub fn with_thread_ids(mut self, include: bool) -> Self {
        self.include_thread_ids = include;
        self
    }

    #[must_use]
    pub fn with_file_line(mut self, include: bool) -> Self {
        self.include_file_line = include;
        self
    }

    /// Filter directives for this configuration. `RUST_LOG`, when set, wins.
    #[must_use]
    pub fn filter(&self) -> tracing_subscriber::EnvFilter {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!(
                "{level},infotron={level}",
                level = self.level
            ))
        })
    }
}

/// Parse a level name as accepted on the command line; unknown names map to INFO
#[must_use]
pub fn parse_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging system
///
/// # Errors
///
/// Returns an error if the log file cannot be created or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let builder = tracing_subscriber::fmt()
        .with_level(true)
        .with_target(true)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_thread_ids(config.include_thread_ids)
        .with_env_filter(config.filter());

    if config.file {
        if let Some(parent) = config.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file_path)?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|e| e as Box<dyn std::error::Error>)?;
    } else if config.console {
        builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| e as Box<dyn std::error::Error>)?;
    } else {
        builder
            .with_writer(std::io::sink)
            .try_init()
            .map_err(|e| e as Box<dyn std::error::Error>)?;
    }

    tracing::debug!("Log config: {:?}", config);
    Ok(())
}

/// Log a statement about to be executed
#[macro_export]
macro_rules! log_query {
    ($query:expr) => {
        tracing::debug!("Executing query: {}", $query);
    };
}

/// Log the size of a result set
#[macro_export]
macro_rules! log_query_result {
    ($columns:expr, $rows:expr) => {
        tracing::debug!("Query returned {} column(s), {} row(s)", $columns, $rows);
    };
}

/// Log an operation's duration
pub fn log_performance_metric(operation: &str, duration: std::time::Duration) {
    tracing::info!(
        operation = %operation,
        duration_ms = duration.as_millis(),
        "Performance metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::new()
            .with_level(Level::DEBUG)
            .with_file(true)
            .with_file_path(PathBuf::from("/tmp/infotron-test.log"));
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.file);
        assert_eq!(config.file_path, PathBuf::from("/tmp/infotron-test.log"));
    }

    #[test]
    fn test_init_logging_reports_second_install() {
        let config = LogConfig::new()
            .with_console(false)
            .with_thread_ids(true)
            .with_file_line(true);
        // only one global subscriber per process
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
