//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use wordkeeper::core::types::{ChatRef, UserId};
use wordkeeper::learning::{LearningEngine, Notice, Notifier, Schedule};
use wordkeeper::llm::{AuthToken, LanguageModel};
use wordkeeper::storage::DictionaryStore;
use wordkeeper::telegram::CommandRouter;
use wordkeeper::{AppError, AppResult};

/// Test schedule: 1 min, 2 min, 5 min
pub const TEST_SCHEDULE_SECS: [u64; 3] = [60, 120, 300];

/// One notice together with where it was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub user: UserId,
    pub chat: ChatRef,
    pub notice: Notice,
}

/// Notifier that forwards every notice to a channel
pub struct RecordingNotifier {
    tx: UnboundedSender<Delivery>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, UnboundedReceiver<Delivery>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user: UserId, chat: ChatRef, notice: Notice) {
        let _ = self.tx.send(Delivery { user, chat, notice });
    }
}

/// Language model that answers from a script
pub struct FakeModel {
    answer: Option<String>,
    questions: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Token exchange always fails
    pub fn failing() -> Self {
        Self {
            answer: None,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn fetch_auth_token(&self) -> AppResult<AuthToken> {
        match self.answer {
            Some(_) => Ok(AuthToken::new("fake-iam", None)),
            None => Err(AppError::ExternalService("token endpoint unavailable".to_string())),
        }
    }

    async fn ask(&self, text: &str, _token: &AuthToken) -> AppResult<String> {
        self.questions.lock().unwrap().push(text.to_string());
        self.answer
            .clone()
            .ok_or_else(|| AppError::ExternalService("completion endpoint unavailable".to_string()))
    }
}

/// Store, engine and router wired together the way `main` does it
pub struct TestEnv {
    pub store: Arc<DictionaryStore>,
    pub engine: Arc<LearningEngine>,
    pub router: CommandRouter,
    pub model: Arc<FakeModel>,
    notices: UnboundedReceiver<Delivery>,
}

impl TestEnv {
    pub fn new(model: FakeModel) -> Self {
        Self::with_store(Arc::new(DictionaryStore::in_memory()), model)
    }

    pub fn with_store(store: Arc<DictionaryStore>, model: FakeModel) -> Self {
        let schedule = Schedule::new(TEST_SCHEDULE_SECS.iter().map(|s| Duration::from_secs(*s)).collect())
            .expect("valid test schedule");
        let (notifier, notices) = RecordingNotifier::new();
        let engine = Arc::new(LearningEngine::new(Arc::clone(&store), Arc::new(notifier), schedule));
        let model = Arc::new(model);
        let router = CommandRouter::new(Arc::clone(&store), Arc::clone(&engine), model.clone())
            .with_bot_username("wordkeeper_bot");

        Self {
            store,
            engine,
            router,
            model,
            notices,
        }
    }

    /// Sends a private message as a user named Ann and returns the reply text
    pub async fn send(&self, user: UserId, text: &str) -> String {
        self.send_in(user, ChatRef::from(user), text).await
    }

    /// Same as [`TestEnv::send`], from any chat
    pub async fn send_in(&self, user: UserId, chat: ChatRef, text: &str) -> String {
        self.router
            .handle(user, chat, Some("Ann"), text)
            .await
            .expect("router stayed silent")
            .text
    }

    /// Waits (in virtual time) for the next notice
    pub async fn next_notice(&mut self) -> (UserId, Notice) {
        let delivery = self.next_delivery().await;
        (delivery.user, delivery.notice)
    }

    pub async fn next_delivery(&mut self) -> Delivery {
        self.notices.recv().await.expect("notifier channel closed")
    }

    /// True if nothing arrives within `window`
    pub async fn quiet_for(&mut self, window: Duration) -> bool {
        tokio::time::timeout(window, self.notices.recv()).await.is_err()
    }
}

pub fn reminder(word: &str, step: usize) -> Notice {
    Notice::Reminder {
        word: word.to_string(),
        step,
        total: TEST_SCHEDULE_SECS.len(),
    }
}
