//! Messages a running session sends on its own
//!
//! The learning engine has no teloxide dependency; it hands [`Notice`]s to a
//! [`Notifier`] and the Telegram layer turns them into chat messages.

use async_trait::async_trait;

use crate::core::types::{ChatRef, UserId};

/// Something a session wants to tell its user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Time to repeat the word; `step` counts from 1
    Reminder { word: String, step: usize, total: usize },
    /// The word disappeared from the dictionary, session ended
    WordRemoved { word: String },
}

/// Delivery channel for [`Notice`]s
///
/// Notices go to `chat`, the chat the session was started from, which is a
/// group chat when `/learn` was sent there. Implementations log delivery
/// failures themselves; a session keeps going even if a reminder could not
/// be sent.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: UserId, chat: ChatRef, notice: Notice);
}
