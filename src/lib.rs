//! Wordkeeper - Telegram bot that keeps a personal dictionary per user
//!
//! Users add words with their meanings, list and delete them, and pick a
//! word to repeat at growing intervals. Free-form questions are forwarded to
//! a language model.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging and shared types
//! - `storage`: The persisted per-user dictionary
//! - `learning`: Spaced-repetition sessions
//! - `llm`: Language-model client
//! - `telegram`: Telegram bot integration, command routing and handlers
//! - `cli`: Command-line interface

pub mod cli;
pub mod core;
pub mod learning;
pub mod llm;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use learning::{LearningEngine, Schedule};
pub use storage::DictionaryStore;
pub use telegram::{CommandRouter, Reply};
