//! # Infotron
//!
//! A terminal SQLite browser. SQL statements are routed by their leading
//! keyword: reads are shown directly, DDL and DML are committed and the
//! view is refreshed. An optional natural-language mode hands questions to
//! a language-model-backed SQL chain.

pub mod ai;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod shell;
pub mod store;
pub mod view;

pub use error::{Error, Result};
