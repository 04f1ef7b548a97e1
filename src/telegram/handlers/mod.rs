//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! All routing decisions live in [`CommandRouter`](crate::telegram::CommandRouter);
//! the handler tree only extracts the sender and text and sends the reply.

mod schema;
mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
