//! The result currently on screen.

use crate::error::Error;
use crate::store::ResultSet;

/// Header of the single column used to show a failure
pub const ERROR_COLUMN: &str = "Error";

/// Columns and rows shown in the results view; always replaced wholesale
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayedResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Set when this display stands in for a failed statement
    pub failed: bool,
}

impl DisplayedResult {
    /// Nothing to show (no tables, or a fresh view)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// One `Error` column holding one message row
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            columns: vec![ERROR_COLUMN.to_string()],
            rows: vec![vec![message.into()]],
            failed: true,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.failed
    }

    /// The message of an error display
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        if self.is_error() {
            self.rows.first().and_then(|row| row.first()).map(String::as_str)
        } else {
            None
        }
    }
}

impl From<ResultSet> for DisplayedResult {
    fn from(set: ResultSet) -> Self {
        Self {
            columns: set.columns,
            rows: set.rows,
            failed: false,
        }
    }
}

impl From<&Error> for DisplayedResult {
    fn from(err: &Error) -> Self {
        Self::error(err.display_message())
    }
}
