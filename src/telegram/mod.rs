//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod messages;
pub mod router;

// Re-exports for convenience
pub use bot::{create_bot, is_message_addressed_to_bot, setup_bot_commands, Command, TelegramNotifier};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use router::{CommandRouter, Reply};
pub use teloxide::Bot;
