//! Language model client
//!
//! A thin client for the Anthropic Messages API plus the [`LanguageModel`]
//! trait the SQL chain is written against, so the chain can be driven by
//! a scripted model in tests.

pub mod client;
pub mod debug_logger;
pub mod error;

pub use client::AnthropicClient;
pub use debug_logger::DebugLogger;
pub use error::{LlmError, LlmResult};

use std::future::Future;

/// Something that turns a prompt into a completion
pub trait LanguageModel {
    /// Complete `prompt`, stopping before any of the `stop` sequences
    fn complete(&self, prompt: &str, stop: &[&str]) -> impl Future<Output = LlmResult<String>> + Send;
}
