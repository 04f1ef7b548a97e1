//! Dispatcher schema

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, ReplyParameters};

use super::types::{HandlerDeps, HandlerError};
use crate::core::types::{ChatRef, UserId};
use crate::telegram::bot::is_message_addressed_to_bot;
use crate::telegram::messages::{split_for_telegram, MAX_MESSAGE_LEN};
use crate::telegram::router::Reply;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// # Arguments
/// * `deps` - Handler dependencies (router, bot identity)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry().branch(text_message_handler(deps))
}

/// Handler for every text message addressed to the bot, commands included
fn text_message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let bot_username = deps.bot_username.clone();
    let bot_id = deps.bot_id;

    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .filter(move |msg: Message| is_message_addressed_to_bot(&msg, bot_username.as_deref(), bot_id))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let Some(from) = msg.from.as_ref() else {
                    return Ok(());
                };
                let Ok(user) = i64::try_from(from.id.0).map(UserId) else {
                    log::warn!("Ignoring message from out-of-range user id {}", from.id);
                    return Ok(());
                };
                let text = msg.text().unwrap_or_default();

                log::info!("Message from user {} in chat {}: {} chars", user, msg.chat.id, text.chars().count());

                let chat = ChatRef::from(msg.chat.id);
                if let Some(reply) = deps.router.handle(user, chat, Some(from.first_name.as_str()), text).await {
                    send_reply(&bot, &msg, reply).await?;
                }
                Ok(())
            }
        })
}

async fn send_reply(bot: &Bot, msg: &Message, reply: Reply) -> Result<(), HandlerError> {
    for (i, chunk) in split_for_telegram(&reply.text, MAX_MESSAGE_LEN).into_iter().enumerate() {
        let mut request = bot.send_message(msg.chat.id, chunk);
        if reply.quote && i == 0 {
            request = request.reply_parameters(ReplyParameters::new(msg.id));
        }
        request.await?;
    }
    Ok(())
}
