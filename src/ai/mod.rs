//! # AI Delegate
//!
//! Natural-language questions are handed unchanged to a question-answering
//! routine; whatever text comes back is shown as is. The delegate does no
//! parsing, validation or SQL extraction of its own.

pub mod chain;
pub mod prompt;

pub use chain::{ChainOutput, ChainStep, SqlChain};

use crate::error::Result;
use crate::llm::LanguageModel;
use std::future::Future;
use tracing::warn;

/// A routine that answers a natural-language question about the database
pub trait QuestionAnswerer {
    fn answer(&self, question: &str) -> impl Future<Output = Result<ChainOutput>> + Send;
}

impl<M: LanguageModel + Sync> QuestionAnswerer for SqlChain<M> {
    fn answer(&self, question: &str) -> impl Future<Output = Result<ChainOutput>> + Send {
        self.run(question)
    }
}

/// Forwards questions to a [`QuestionAnswerer`] and renders the outcome as text
pub struct AiDelegate<Q> {
    answerer: Q,
}

impl<Q: QuestionAnswerer> AiDelegate<Q> {
    pub fn new(answerer: Q) -> Self {
        Self { answerer }
    }

    pub fn answerer(&self) -> &Q {
        &self.answerer
    }

    /// Ask a question; failures come back as `Error: <message>`
    pub async fn ask(&self, question: &str) -> String {
        match self.answerer.answer(question).await {
            Ok(output) => output.to_string(),
            Err(e) => {
                warn!("Question failed: {e}");
                format!("Error: {e}")
            }
        }
    }
}
