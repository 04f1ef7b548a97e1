use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Telegram user identifier, stable across sessions
///
/// Serialized as the bare number, so it doubles as a JSON object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|e| format!("Invalid user id '{}': {}", s, e))
    }
}

/// Telegram chat a session talks in
///
/// A private chat has the same id as its user; group chats have their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatRef(pub i64);

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for ChatRef {
    fn from(user: UserId) -> Self {
        ChatRef(user.0)
    }
}

impl From<teloxide::types::ChatId> for ChatRef {
    fn from(chat_id: teloxide::types::ChatId) -> Self {
        ChatRef(chat_id.0)
    }
}

impl From<ChatRef> for teloxide::types::ChatId {
    fn from(chat: ChatRef) -> Self {
        teloxide::types::ChatId(chat.0)
    }
}
