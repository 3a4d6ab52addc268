//! Verbosity-gated logging of language model traffic.
//!
//! Prompts can be large and may contain sample rows, so bodies are only
//! logged in full at trace verbosity.

use crate::config::{LOG_BODY_LIMIT, VerbosityLevel};
use tracing::{debug, error, trace, warn};

/// Debug logger for language model requests
#[derive(Debug, Clone)]
pub struct DebugLogger {
    verbosity: VerbosityLevel,
}

impl DebugLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    pub fn is_enabled(&self) -> bool {
        self.verbosity != VerbosityLevel::Silent
    }

    /// Log a message if the current verbosity level allows it
    pub fn log(&self, level: VerbosityLevel, message: &str) {
        if !self.is_enabled() || level > self.verbosity {
            return;
        }
        match level {
            VerbosityLevel::Error => error!(target: "infotron::llm", "{}", message),
            VerbosityLevel::Warning => warn!(target: "infotron::llm", "{}", message),
            VerbosityLevel::Info | VerbosityLevel::Debug => {
                debug!(target: "infotron::llm", "{}", message)
            }
            VerbosityLevel::Trace => trace!(target: "infotron::llm", "{}", message),
            VerbosityLevel::Silent => {}
        }
    }

    pub fn error(&self, message: &str) {
        self.log(VerbosityLevel::Error, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(VerbosityLevel::Debug, message);
    }

    pub fn trace(&self, message: &str) {
        self.log(VerbosityLevel::Trace, message);
    }

    /// Log an outgoing request
    pub fn log_request(&self, url: &str, body: &str) {
        self.debug(&format!("API Request: POST {url}"));
        if self.verbosity >= VerbosityLevel::Trace {
            self.trace("=== FULL REQUEST BODY ===");
            for line in body.lines() {
                self.trace(line);
            }
            self.trace("=========================");
        } else {
            self.debug(&format!("Body: {}", truncate(body, LOG_BODY_LIMIT)));
        }
    }

    /// Log a response status and body
    pub fn log_response(&self, status: u16, body: &str, duration_ms: u128) {
        self.debug(&format!("API Response: Status {status} in {duration_ms}ms"));
        self.trace(&format!("Response Body: {}", truncate(body, LOG_BODY_LIMIT)));
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::new(VerbosityLevel::default())
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &text[..end])
}
