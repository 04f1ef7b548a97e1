//! Spaced-repetition sessions, one per user
//!
//! A session starts with `/learn` (AwaitingWord), gets its word from the next
//! message and then runs as a background task that sleeps through the
//! [`Schedule`], asks for a translation after every delay (AwaitingAnswer) and
//! waits for the answer before starting the next delay.
//!
//! Sessions live in a registry keyed by user. Every entry carries a
//! cancellation token and a generation number, so a replaced or stopped
//! session's task exits at its next suspension point and never touches the
//! entry of its successor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::notifier::{Notice, Notifier};
use super::schedule::Schedule;
use crate::core::types::{ChatRef, UserId};
use crate::storage::DictionaryStore;

/// Where a session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `/learn` was sent, the word has not arrived yet
    AwaitingWord,
    /// Sleeping before reminder `step`
    Scheduled { step: usize },
    /// Reminder `step` was sent, waiting for the answer
    AwaitingAnswer { step: usize },
}

/// Result of [`LearningEngine::choose_word`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordChoice {
    Started { steps: usize },
    NotFound,
    NoSessionPending,
}

/// Result of [`LearningEngine::submit_answer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    NoQuestionPending,
    Correct { completed: bool },
    Incorrect { meanings: Vec<String>, completed: bool },
    /// The word left the dictionary while the question was open; session ended
    WordRemoved { word: String },
}

struct SessionEntry {
    generation: u64,
    chat: ChatRef,
    word: Option<String>,
    phase: Phase,
    cancel: CancellationToken,
    answered: Arc<Notify>,
}

pub struct LearningEngine {
    store: Arc<DictionaryStore>,
    notifier: Arc<dyn Notifier>,
    schedule: Schedule,
    sessions: Mutex<HashMap<UserId, SessionEntry>>,
    next_generation: AtomicU64,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl LearningEngine {
    pub fn new(store: Arc<DictionaryStore>, notifier: Arc<dyn Notifier>, schedule: Schedule) -> Self {
        Self {
            store,
            notifier,
            schedule,
            sessions: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a fresh session waiting for its word; its notices go to `chat`
    ///
    /// Returns `true` if it replaced a session that was still running.
    pub fn begin(&self, user: UserId, chat: ChatRef) -> bool {
        let entry = SessionEntry {
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
            chat,
            word: None,
            phase: Phase::AwaitingWord,
            cancel: self.shutdown.child_token(),
            answered: Arc::new(Notify::new()),
        };

        let previous = self.lock().insert(user, entry);
        match previous {
            Some(old) => {
                old.cancel.cancel();
                log::info!("User {} restarted learning, previous session cancelled", user);
                true
            }
            None => false,
        }
    }

    /// Fixes the word of a session in AwaitingWord and starts its timeline
    pub fn choose_word(self: &Arc<Self>, user: UserId, word: &str) -> WordChoice {
        let mut sessions = self.lock();

        let pending = matches!(sessions.get(&user), Some(entry) if entry.phase == Phase::AwaitingWord);
        if !pending {
            return WordChoice::NoSessionPending;
        }

        if !self.store.has_word(user, word) {
            if let Some(entry) = sessions.remove(&user) {
                entry.cancel.cancel();
            }
            log::info!("User {} tried to learn unknown word '{}'", user, word);
            return WordChoice::NotFound;
        }

        let Some(entry) = sessions.get_mut(&user) else {
            return WordChoice::NoSessionPending;
        };
        entry.word = Some(word.to_string());
        entry.phase = Phase::Scheduled { step: 0 };

        let generation = entry.generation;
        let chat = entry.chat;
        let cancel = entry.cancel.clone();
        let answered = Arc::clone(&entry.answered);
        drop(sessions);

        log::info!(
            "User {} started learning '{}' ({} repetitions)",
            user,
            word,
            self.schedule.len()
        );

        self.tracker.spawn(Arc::clone(self).run_session(
            user,
            chat,
            word.to_string(),
            generation,
            cancel,
            answered,
        ));

        WordChoice::Started {
            steps: self.schedule.len(),
        }
    }

    /// Checks an answer to the open question, case-insensitively
    pub fn submit_answer(&self, user: UserId, answer: &str) -> AnswerOutcome {
        let mut sessions = self.lock();

        let Some((step, word)) = sessions.get(&user).and_then(|entry| match (entry.phase, &entry.word) {
            (Phase::AwaitingAnswer { step }, Some(word)) => Some((step, word.clone())),
            _ => None,
        }) else {
            return AnswerOutcome::NoQuestionPending;
        };

        let Some(meanings) = self.store.meanings_of(user, &word) else {
            if let Some(entry) = sessions.remove(&user) {
                entry.cancel.cancel();
            }
            log::info!("User {} answered for '{}', which is no longer in the dictionary", user, word);
            return AnswerOutcome::WordRemoved { word };
        };

        let completed = step + 1 >= self.schedule.len();
        if completed {
            // The task is parked on `answered`; waking it lets the loop run out
            if let Some(entry) = sessions.remove(&user) {
                entry.answered.notify_one();
            }
            log::info!("User {} completed learning '{}'", user, word);
        } else if let Some(entry) = sessions.get_mut(&user) {
            entry.phase = Phase::Scheduled { step: step + 1 };
            entry.answered.notify_one();
        }

        if is_correct(&meanings, answer) {
            AnswerOutcome::Correct { completed }
        } else {
            AnswerOutcome::Incorrect { meanings, completed }
        }
    }

    /// Cancels the user's session, if any
    pub fn stop(&self, user: UserId) -> bool {
        match self.lock().remove(&user) {
            Some(entry) => {
                entry.cancel.cancel();
                log::info!("User {} stopped learning {:?}", user, entry.word);
                true
            }
            None => false,
        }
    }

    /// Cancels the user's session if it is about `word`
    pub fn abandon_word(&self, user: UserId, word: &str) -> bool {
        let mut sessions = self.lock();
        if sessions.get(&user).and_then(|e| e.word.as_deref()) != Some(word) {
            return false;
        }
        if let Some(entry) = sessions.remove(&user) {
            entry.cancel.cancel();
        }
        log::info!("User {} deleted '{}', learning session cancelled", user, word);
        true
    }

    pub fn phase(&self, user: UserId) -> Option<Phase> {
        self.lock().get(&user).map(|e| e.phase)
    }

    pub fn current_word(&self, user: UserId) -> Option<String> {
        self.lock().get(&user).and_then(|e| e.word.clone())
    }

    pub fn active_sessions(&self) -> usize {
        self.lock().len()
    }

    /// Cancels every session and waits for their tasks to exit
    pub async fn shutdown(&self) {
        let count = {
            let mut sessions = self.lock();
            let count = sessions.len();
            sessions.clear();
            count
        };
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        log::info!("Learning engine stopped ({} session(s) cancelled)", count);
    }

    async fn run_session(
        self: Arc<Self>,
        user: UserId,
        chat: ChatRef,
        word: String,
        generation: u64,
        cancel: CancellationToken,
        answered: Arc<Notify>,
    ) {
        let total = self.schedule.len();

        for (step, delay) in self.schedule.delays().iter().copied().enumerate() {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            if !self.store.has_word(user, &word) {
                if self.finish(user, generation) {
                    log::info!("'{}' was removed from user {}'s dictionary, session ended", word, user);
                    self.notifier
                        .notify(user, chat, Notice::WordRemoved { word: word.clone() })
                        .await;
                }
                return;
            }

            if !self.set_phase(user, generation, Phase::AwaitingAnswer { step }) {
                return;
            }

            self.notifier
                .notify(
                    user,
                    chat,
                    Notice::Reminder {
                        word: word.clone(),
                        step: step + 1,
                        total,
                    },
                )
                .await;

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = answered.notified() => {}
            }
        }
    }

    /// Removes the entry if it still belongs to this generation
    fn finish(&self, user: UserId, generation: u64) -> bool {
        let mut sessions = self.lock();
        if sessions.get(&user).map(|e| e.generation) == Some(generation) {
            sessions.remove(&user);
            true
        } else {
            false
        }
    }

    fn set_phase(&self, user: UserId, generation: u64, phase: Phase) -> bool {
        match self.lock().get_mut(&user) {
            Some(entry) if entry.generation == generation => {
                entry.phase = phase;
                true
            }
            _ => false,
        }
    }
}

fn is_correct(meanings: &[String], answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    meanings.iter().any(|m| m.to_lowercase() == answer)
}
