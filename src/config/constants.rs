//! Default values for the browser, the language model client and the SQL chain.

/// Database file opened when nothing else is configured
pub const DEFAULT_DATABASE_PATH: &str = "database/database.db";

/// Anthropic API base URL
pub const ANTHROPIC_API_BASE_URL: &str = "https://api.anthropic.com";

/// Path of the Messages endpoint, relative to the base URL
pub const MESSAGES_PATH: &str = "/v1/messages";

/// Value of the `anthropic-version` header
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Model used for SQL generation
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Sampling temperature; zero keeps the generated SQL deterministic
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Upper bound on tokens generated per completion
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Timeout for a single language model request
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// User agent sent with every API request
pub const DEFAULT_USER_AGENT: &str = concat!("infotron/", env!("CARGO_PKG_VERSION"));

/// Environment variable holding the API credential
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Rows sampled per table when describing the schema to the model
pub const DEFAULT_SAMPLE_ROWS_IN_TABLE_INFO: usize = 0;

/// Row limit the model is asked to respect for open-ended questions
pub const DEFAULT_TOP_K: usize = 5;

/// Shell history file
pub const DEFAULT_HISTORY_FILE: &str = "infotron_history.txt";

/// Request/response bodies longer than this are truncated in logs
pub const LOG_BODY_LIMIT: usize = 500;

/// Verbosity levels for the language model debug logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    Silent = 0,
    Error = 1,
    Warning = 2,
    #[default]
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl From<u8> for VerbosityLevel {
    fn from(value: u8) -> Self {
        match value {
            0 => VerbosityLevel::Silent,
            1 => VerbosityLevel::Error,
            2 => VerbosityLevel::Warning,
            3 => VerbosityLevel::Info,
            4 => VerbosityLevel::Debug,
            _ => VerbosityLevel::Trace,
        }
    }
}
