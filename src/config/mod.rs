//! # Configuration
//!
//! Application settings loaded from a TOML or JSON file, then overridden by
//! environment variables and finally by command line flags.

pub mod constants;

pub use constants::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// SQL chain configuration
    #[serde(default)]
    pub chain: ChainConfig,

    /// Shell configuration
    #[serde(default)]
    pub shell: ShellConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `anthropic-version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// API key (normally supplied through the environment)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Verbosity of request/response logging (0 = silent, 5 = trace)
    #[serde(default = "default_verbosity_level")]
    pub verbosity_level: u8,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
            api_key: None,
            verbosity_level: default_verbosity_level(),
        }
    }
}

/// SQL chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Sample rows appended to each table description
    #[serde(default = "default_sample_rows")]
    pub sample_rows_in_table_info: usize,

    /// Ask the model to double-check generated SQL before running it
    #[serde(default = "default_true")]
    pub use_query_checker: bool,

    /// Return the raw SQL result instead of a prose answer
    #[serde(default)]
    pub return_direct: bool,

    /// Row limit suggested to the model
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            sample_rows_in_table_info: default_sample_rows(),
            use_query_checker: true,
            return_direct: false,
            top_k: default_top_k(),
        }
    }
}

/// Shell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// History file; history is not persisted when unset
    #[serde(default = "default_history_file")]
    pub history_file: Option<PathBuf>,

    /// Start in natural-language mode
    #[serde(default)]
    pub start_in_ai_mode: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            start_in_ai_mode: false,
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}

fn default_base_url() -> String {
    ANTHROPIC_API_BASE_URL.to_string()
}

fn default_api_version() -> String {
    ANTHROPIC_API_VERSION.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout() -> u64 {
    DEFAULT_LLM_TIMEOUT_SECS
}

fn default_verbosity_level() -> u8 {
    VerbosityLevel::Info as u8
}

fn default_sample_rows() -> usize {
    DEFAULT_SAMPLE_ROWS_IN_TABLE_INFO
}

fn default_true() -> bool {
    true
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_history_file() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_HISTORY_FILE))
}

impl AppConfig {
    /// Load configuration from a file; `.toml` files are parsed as TOML,
    /// everything else as JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

        if path.as_ref().extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse TOML config: {e}")))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse JSON config: {e}")))
        }
    }

    /// Apply environment variable overrides
    pub fn apply_environment_overrides(&mut self) {
        if let Ok(path) = std::env::var("INFOTRON_DATABASE") {
            self.database.path = PathBuf::from(path);
        }

        if let Ok(api_key) = std::env::var(API_KEY_ENV)
            && !api_key.trim().is_empty()
        {
            self.llm.api_key = Some(api_key);
        }
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            self.llm.model = model;
        }
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("INFOTRON_LLM_TIMEOUT_SECS")
            && let Ok(timeout_secs) = timeout.parse()
        {
            self.llm.timeout_secs = timeout_secs;
        }
    }

    /// Get the API key, failing when none was configured
    pub fn api_key(&self) -> Result<String> {
        self.llm.api_key.clone().ok_or_else(|| {
            Error::Config(format!(
                "{API_KEY_ENV} must be provided via config, .env file or environment variable"
            ))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.llm.base_url.trim().is_empty() {
            return Err(Error::Config("LLM base URL cannot be empty".to_string()));
        }

        if self.llm.timeout_secs == 0 {
            return Err(Error::Config(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(Error::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "Temperature must be between 0 and 1, got {}",
                self.llm.temperature
            )));
        }

        Ok(())
    }
}
