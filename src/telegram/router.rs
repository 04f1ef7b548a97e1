//! Turns one incoming text into one reply
//!
//! Commands are parsed with [`Command`]; anything else is routed by the
//! sender's learning phase: the word after `/learn`, the answer to an open
//! question, or a question for the language model. The router knows nothing
//! about teloxide's `Message`, so the whole flow is testable without Telegram.

use std::sync::Arc;

use teloxide::utils::command::{BotCommands, ParseError};

use super::bot::Command;
use super::messages;
use crate::core::error::{AppError, AppResult};
use crate::core::types::{ChatRef, UserId};
use crate::learning::{AnswerOutcome, LearningEngine, Phase, WordChoice};
use crate::llm::LanguageModel;
use crate::storage::{AddOutcome, DictionaryStore, MeaningRemoval};

/// What to send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Send as a reply to the incoming message
    pub quote: bool,
}

impl Reply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quote: false,
        }
    }

    fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quote: true,
        }
    }
}

pub struct CommandRouter {
    store: Arc<DictionaryStore>,
    engine: Arc<LearningEngine>,
    model: Arc<dyn LanguageModel>,
    bot_username: String,
}

impl CommandRouter {
    pub fn new(store: Arc<DictionaryStore>, engine: Arc<LearningEngine>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            store,
            engine,
            model,
            bot_username: String::new(),
        }
    }

    /// Commands written as `/cmd@name` are only accepted for this name
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = username.into();
        self
    }

    /// Handles one message sent by `user` in `chat`; `None` means stay silent
    pub async fn handle(&self, user: UserId, chat: ChatRef, first_name: Option<&str>, text: &str) -> Option<Reply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if text.starts_with('/') {
            match Command::parse(text, &self.bot_username) {
                Ok(command) => return Some(self.handle_command(user, chat, first_name, command, text).await),
                Err(ParseError::UnknownCommand(_)) => {}
                Err(ParseError::WrongBotName(name)) => {
                    log::debug!("Ignoring command for another bot ({}) from user {}", name, user);
                    return None;
                }
                Err(e) => {
                    log::debug!("Malformed command from user {}: {}", user, e);
                    let usage = messages::usage_for(command_name(text)).map_or_else(messages::help, str::to_string);
                    return Some(Reply::plain(usage));
                }
            }
        }

        Some(self.handle_text(user, text).await)
    }

    async fn handle_command(
        &self,
        user: UserId,
        chat: ChatRef,
        first_name: Option<&str>,
        command: Command,
        text: &str,
    ) -> Reply {
        log::info!("Command {:?} from user {}", command, user);

        let without_args = raw_args(text).is_empty();
        let result = match command {
            // Deep links arrive as `/start <payload>`
            Command::Start => Ok(Reply::plain(messages::greeting(first_name))),
            Command::Help if without_args => Ok(Reply::plain(messages::help())),
            Command::AddWord(args) => self.add_word(user, &args),
            Command::DeleteWord(args) => self.delete_word(user, &args),
            Command::DeleteMeaning(args) => self.delete_meaning(user, &args),
            Command::MyDict if without_args => Ok(self.my_dict(user)),
            Command::Learn if without_args => Ok(self.learn(user, chat)),
            Command::Check(answer) => self.check(user, &answer),
            Command::StopLearning if without_args => Ok(self.stop_learning(user)),
            _ => Err(usage_error(command_name(text))),
        };

        result.unwrap_or_else(|e| error_reply(user, e))
    }

    fn add_word(&self, user: UserId, args: &str) -> AppResult<Reply> {
        let [word, meaning] = exact_args::<2>(args, "add_word")?;

        let text = match self.store.add_meaning(user, word, meaning)? {
            AddOutcome::Added => messages::WORD_ADDED,
            AddOutcome::AlreadyExists => messages::MEANING_EXISTS,
        };
        Ok(Reply::plain(text))
    }

    fn delete_word(&self, user: UserId, args: &str) -> AppResult<Reply> {
        let [word] = exact_args::<1>(args, "delete_word")?;
        if self.store.word_count(user) == 0 {
            return Ok(Reply::plain(messages::DICTIONARY_EMPTY_ADD_FIRST));
        }

        self.store.remove_word(user, word)?;
        Ok(Reply::plain(self.with_abandoned_session(
            user,
            word,
            messages::WORD_DELETED.to_string(),
        )))
    }

    fn delete_meaning(&self, user: UserId, args: &str) -> AppResult<Reply> {
        let [word, meaning] = exact_args::<2>(args, "delete_meaning")?;
        if self.store.word_count(user) == 0 {
            return Ok(Reply::plain(messages::DICTIONARY_EMPTY_ADD_FIRST));
        }

        let text = match self.store.remove_meaning(user, word, meaning)? {
            MeaningRemoval::MeaningRemoved => messages::MEANING_DELETED.to_string(),
            MeaningRemoval::WordRemoved => {
                self.with_abandoned_session(user, word, messages::last_meaning_deleted(word))
            }
        };
        Ok(Reply::plain(text))
    }

    /// Stops a session on a word that just left the dictionary
    fn with_abandoned_session(&self, user: UserId, word: &str, mut text: String) -> String {
        if self.engine.abandon_word(user, word) {
            text.push('\n');
            text.push_str(&messages::session_cancelled(word));
        }
        text
    }

    fn my_dict(&self, user: UserId) -> Reply {
        Reply::plain(messages::dictionary(&self.store.list_words(user)))
    }

    fn learn(&self, user: UserId, chat: ChatRef) -> Reply {
        if self.engine.begin(user, chat) {
            Reply::plain(format!(
                "{}\n{}",
                messages::previous_session_replaced(),
                messages::ENTER_WORD
            ))
        } else {
            Reply::plain(messages::ENTER_WORD)
        }
    }

    fn check(&self, user: UserId, answer: &str) -> AppResult<Reply> {
        if answer.trim().is_empty() {
            return Err(usage_error("check"));
        }
        Ok(self.answer(user, answer))
    }

    fn stop_learning(&self, user: UserId) -> Reply {
        if self.engine.stop(user) {
            Reply::plain(messages::LEARNING_STOPPED)
        } else {
            Reply::plain(messages::NOT_LEARNING)
        }
    }

    async fn handle_text(&self, user: UserId, text: &str) -> Reply {
        match self.engine.phase(user) {
            Some(Phase::AwaitingWord) => self.choose_word(user, text).await,
            Some(Phase::AwaitingAnswer { .. }) => self.answer(user, text),
            _ => self.ask_model(user, text).await,
        }
    }

    async fn choose_word(&self, user: UserId, word: &str) -> Reply {
        match self.engine.choose_word(user, word) {
            WordChoice::Started { steps } => Reply::plain(messages::learning_started(steps)),
            WordChoice::NotFound => Reply::plain(messages::LEARN_WORD_NOT_FOUND),
            // The session went away between the phase check and now
            WordChoice::NoSessionPending => self.ask_model(user, word).await,
        }
    }

    fn answer(&self, user: UserId, answer: &str) -> Reply {
        let word = self.engine.current_word(user);
        let text = match self.engine.submit_answer(user, answer) {
            AnswerOutcome::NoQuestionPending => messages::NO_QUESTION.to_string(),
            AnswerOutcome::Correct { completed } => {
                with_completion(messages::CORRECT.to_string(), completed, word.as_deref())
            }
            AnswerOutcome::Incorrect { meanings, completed } => {
                with_completion(messages::incorrect(&meanings), completed, word.as_deref())
            }
            AnswerOutcome::WordRemoved { .. } => messages::ANSWER_WORD_REMOVED.to_string(),
        };
        Reply::plain(text)
    }

    async fn ask_model(&self, user: UserId, text: &str) -> Reply {
        match self.query_model(text).await {
            Ok(answer) => Reply::quoted(answer),
            Err(e) => {
                log::error!("Language model request for user {} failed: {}", user, e);
                Reply::plain(messages::MODEL_UNAVAILABLE)
            }
        }
    }

    async fn query_model(&self, text: &str) -> AppResult<String> {
        let token = self.model.fetch_auth_token().await?;
        self.model.ask(text, &token).await
    }
}

fn usage_error(command: &str) -> AppError {
    AppError::Usage(messages::usage_for(command).unwrap_or_default().to_string())
}

/// Reply for a failed command; the bot's own failures are logged
fn error_reply(user: UserId, error: AppError) -> Reply {
    if !error.is_user_facing() {
        log::error!("Command from user {} failed: {}", user, error);
    }
    let text = match error {
        AppError::Usage(usage) => usage,
        AppError::WordNotFound(_) => messages::WORD_NOT_FOUND.to_string(),
        AppError::MeaningNotFound { .. } => messages::MEANING_NOT_FOUND.to_string(),
        _ => messages::SAVE_FAILED.to_string(),
    };
    Reply::plain(text)
}

fn with_completion(mut text: String, completed: bool, word: Option<&str>) -> String {
    if let (true, Some(word)) = (completed, word) {
        text.push('\n');
        text.push_str(&messages::completed(word));
    }
    text
}

/// Exactly `N` whitespace-separated arguments, or the command's usage
fn exact_args<'a, const N: usize>(args: &'a str, command: &str) -> AppResult<[&'a str; N]> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    parts.try_into().map_err(|_| usage_error(command))
}

/// `add_word` for `/add_word@bot dog ...`
fn command_name(text: &str) -> &str {
    let head = text.split_whitespace().next().unwrap_or_default();
    let head = head.trim_start_matches('/');
    head.split('@').next().unwrap_or_default()
}

/// Everything after the command token
fn raw_args(text: &str) -> &str {
    text.trim()
        .split_once(char::is_whitespace)
        .map_or("", |(_, rest)| rest.trim())
}
