//! Bot initialization and message routing utilities
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Message addressing logic (private chats, mentions, replies)
//! - The [`Notifier`] that delivers session notices as chat messages

use async_trait::async_trait;
use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, Message, MessageEntityKind};
use teloxide::utils::command::BotCommands;

use super::messages;
use crate::core::config;
use crate::core::types::{ChatRef, UserId};
use crate::learning::{Notice, Notifier};

/// Bot commands enum with descriptions
///
/// Commands with arguments take the whole remainder; the router checks
/// the argument count itself so every malformed call gets its usage line.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "say hello")]
    Start,
    #[command(description = "show what I can do")]
    Help,
    #[command(description = "add a word or a meaning: /add_word <word> <meaning>")]
    AddWord(String),
    #[command(description = "delete a word: /delete_word <word>")]
    DeleteWord(String),
    #[command(description = "delete a meaning: /delete_meaning <word> <meaning>")]
    DeleteMeaning(String),
    #[command(description = "show your dictionary")]
    MyDict,
    #[command(description = "start repeating a word")]
    Learn,
    #[command(description = "answer the current question: /check <answer>")]
    Check(String),
    #[command(description = "stop repeating")]
    StopLearning,
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - No token, invalid URL or client build failure
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN is not set");
    }
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;

    let bot = match config::BOT_API_URL.as_deref() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            Bot::with_client(token, client).set_api_url(url)
        }
        None => Bot::with_client(token, client),
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Checks if a message is addressed to the bot
///
/// # Arguments
/// * `msg` - Message to check
/// * `bot_username` - Bot's username (without @)
/// * `bot_id` - Bot's user ID
///
/// # Returns
/// * `true` for private chats, bot mentions and replies to the bot
pub fn is_message_addressed_to_bot(msg: &Message, bot_username: Option<&str>, bot_id: teloxide::types::UserId) -> bool {
    if matches!(msg.chat.kind, ChatKind::Private(_)) {
        return true;
    }

    if let Some(from) = msg.reply_to_message().and_then(|reply| reply.from.as_ref()) {
        if from.id == bot_id {
            return true;
        }
    }

    let (Some(text), Some(username)) = (msg.text(), bot_username) else {
        return false;
    };

    // Entity offsets are UTF-16 based, so compare through the parsed entities
    let mentioned = msg.parse_entities().is_some_and(|entities| {
        entities.iter().any(|entity| {
            matches!(entity.kind(), MessageEntityKind::Mention)
                && entity.text().trim_start_matches('@').eq_ignore_ascii_case(username)
        })
    });

    mentioned || text.contains(&format!("@{}", username))
}

/// Sends session notices to the chat each session was started from
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, user: UserId, chat: ChatRef, notice: Notice) {
        let text = messages::notice(&notice);
        if let Err(e) = self.bot.send_message(ChatId::from(chat), text).await {
            log::error!("Failed to deliver {:?} to user {} in chat {}: {}", notice, user, chat, e);
        }
    }
}
