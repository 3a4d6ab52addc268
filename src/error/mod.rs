//! # Error Handling
//!
//! Error types shared by the store, the table view, the SQL chain and the shell.

use crate::llm::LlmError;
use thiserror::Error;

/// Main error type for the browser
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Language model error: {0}")]
    Llm(#[from] LlmError),

    #[error("SQL chain error: {0}")]
    Chain(String),

    #[error("Statement returns no rows to display: {0}")]
    NotAQuery(String),

    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl Error {
    /// True when the failure came from SQLite itself
    #[must_use]
    pub fn is_database(&self) -> bool {
        matches!(self, Error::Database(_))
    }

    /// Message shown in the single error cell of the results view.
    ///
    /// SQLite failures and everything else are the two tiers the view
    /// distinguishes; both end up as one cell.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Error::Database(e) => format!("Database error: {e}"),
            other => format!("Error: {other}"),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
