//! Spaced-repetition sessions driven through the engine, on a paused clock
//!
//! Run with: cargo test --test learning_test

mod common;

use std::time::Duration;

use common::{reminder, Delivery, FakeModel, TestEnv};
use pretty_assertions::assert_eq;
use tokio::time::Instant;
use wordkeeper::core::types::{ChatRef, UserId};
use wordkeeper::learning::{AnswerOutcome, Notice, Phase, WordChoice};

const ANN: UserId = UserId(1001);
const BOB: UserId = UserId(2002);
const TWO_WEEKS: Duration = Duration::from_secs(14 * 24 * 3600);

fn env_with_words() -> TestEnv {
    let env = TestEnv::new(FakeModel::answering("unused"));
    env.store.add_meaning(ANN, "dog", "собака").unwrap();
    env.store.add_meaning(ANN, "cat", "кот").unwrap();
    env.store.add_meaning(ANN, "cat", "кошка").unwrap();
    env.store.add_meaning(BOB, "sun", "солнце").unwrap();
    env
}

#[tokio::test(start_paused = true)]
async fn test_full_session_follows_schedule() {
    let mut env = env_with_words();
    let started = Instant::now();

    assert!(!env.engine.begin(ANN, ChatRef::from(ANN)));
    assert_eq!(env.engine.phase(ANN), Some(Phase::AwaitingWord));
    assert_eq!(env.engine.choose_word(ANN, "dog"), WordChoice::Started { steps: 3 });
    assert_eq!(env.engine.phase(ANN), Some(Phase::Scheduled { step: 0 }));

    assert_eq!(env.next_notice().await, (ANN, reminder("dog", 1)));
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(env.engine.phase(ANN), Some(Phase::AwaitingAnswer { step: 0 }));
    assert_eq!(
        env.engine.submit_answer(ANN, " Собака "),
        AnswerOutcome::Correct { completed: false }
    );
    assert_eq!(env.engine.phase(ANN), Some(Phase::Scheduled { step: 1 }));

    let answered_at = Instant::now();
    assert_eq!(env.next_notice().await, (ANN, reminder("dog", 2)));
    assert!(answered_at.elapsed() >= Duration::from_secs(120));
    assert_eq!(
        env.engine.submit_answer(ANN, "пёс"),
        AnswerOutcome::Incorrect {
            meanings: vec!["собака".to_string()],
            completed: false
        }
    );

    assert_eq!(env.next_notice().await, (ANN, reminder("dog", 3)));
    assert_eq!(
        env.engine.submit_answer(ANN, "собака"),
        AnswerOutcome::Correct { completed: true }
    );

    assert_eq!(env.engine.phase(ANN), None);
    assert!(env.quiet_for(TWO_WEEKS).await);
    assert_eq!(env.engine.active_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reminder_waits_for_the_answer() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "cat");

    assert_eq!(env.next_notice().await, (ANN, reminder("cat", 1)));
    // No second reminder while the first question is open
    assert!(env.quiet_for(TWO_WEEKS).await);
    assert_eq!(env.engine.phase(ANN), Some(Phase::AwaitingAnswer { step: 0 }));

    assert_eq!(
        env.engine.submit_answer(ANN, "КОШКА"),
        AnswerOutcome::Correct { completed: false }
    );
    assert_eq!(env.next_notice().await, (ANN, reminder("cat", 2)));
}

#[tokio::test(start_paused = true)]
async fn test_unknown_word_ends_session() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));

    assert_eq!(env.engine.choose_word(ANN, "horse"), WordChoice::NotFound);
    assert_eq!(env.engine.phase(ANN), None);
    assert!(env.quiet_for(TWO_WEEKS).await);
}

#[tokio::test(start_paused = true)]
async fn test_word_without_learn_is_not_pending() {
    let env = env_with_words();

    assert_eq!(env.engine.choose_word(ANN, "dog"), WordChoice::NoSessionPending);
    assert_eq!(env.engine.submit_answer(ANN, "собака"), AnswerOutcome::NoQuestionPending);
}

#[tokio::test(start_paused = true)]
async fn test_answer_before_reminder_is_not_accepted() {
    let env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");

    assert_eq!(env.engine.submit_answer(ANN, "собака"), AnswerOutcome::NoQuestionPending);
    assert_eq!(env.engine.phase(ANN), Some(Phase::Scheduled { step: 0 }));
}

#[tokio::test(start_paused = true)]
async fn test_word_removed_while_sleeping() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");

    env.store.remove_word(ANN, "dog").unwrap();

    assert_eq!(
        env.next_notice().await,
        (
            ANN,
            Notice::WordRemoved {
                word: "dog".to_string()
            }
        )
    );
    assert_eq!(env.engine.phase(ANN), None);
    assert!(env.quiet_for(TWO_WEEKS).await);
}

#[tokio::test(start_paused = true)]
async fn test_word_removed_while_question_open() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");
    assert_eq!(env.next_notice().await, (ANN, reminder("dog", 1)));

    env.store.remove_word(ANN, "dog").unwrap();

    assert_eq!(
        env.engine.submit_answer(ANN, "собака"),
        AnswerOutcome::WordRemoved {
            word: "dog".to_string()
        }
    );
    assert_eq!(env.engine.phase(ANN), None);
    assert!(env.quiet_for(TWO_WEEKS).await);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_reminders() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");

    assert!(env.engine.stop(ANN));
    assert!(!env.engine.stop(ANN));
    assert!(env.quiet_for(TWO_WEEKS).await);
    assert_eq!(env.engine.active_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_new_learn_replaces_running_session() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");

    assert!(env.engine.begin(ANN, ChatRef::from(ANN)));
    assert_eq!(env.engine.phase(ANN), Some(Phase::AwaitingWord));
    assert_eq!(env.engine.choose_word(ANN, "cat"), WordChoice::Started { steps: 3 });

    // Only the new session talks
    assert_eq!(env.next_notice().await, (ANN, reminder("cat", 1)));
    assert!(env.quiet_for(TWO_WEEKS).await);
    assert_eq!(env.engine.current_word(ANN).as_deref(), Some("cat"));
}

#[tokio::test(start_paused = true)]
async fn test_abandon_word_only_matches_current_word() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");

    assert!(!env.engine.abandon_word(ANN, "cat"));
    assert!(env.engine.abandon_word(ANN, "dog"));
    assert!(env.quiet_for(TWO_WEEKS).await);
}

#[tokio::test(start_paused = true)]
async fn test_users_are_independent() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");
    env.engine.begin(BOB, ChatRef::from(BOB));
    env.engine.choose_word(BOB, "sun");
    assert_eq!(env.engine.active_sessions(), 2);

    let mut first = vec![env.next_notice().await, env.next_notice().await];
    first.sort_by_key(|(user, _)| *user);
    assert_eq!(first, vec![(ANN, reminder("dog", 1)), (BOB, reminder("sun", 1))]);

    // Bob stops, Ann keeps going
    assert!(env.engine.stop(BOB));
    assert_eq!(
        env.engine.submit_answer(BOB, "солнце"),
        AnswerOutcome::NoQuestionPending
    );
    assert_eq!(
        env.engine.submit_answer(ANN, "собака"),
        AnswerOutcome::Correct { completed: false }
    );
    assert_eq!(env.next_notice().await, (ANN, reminder("dog", 2)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_sessions() {
    let mut env = env_with_words();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");
    env.engine.begin(BOB, ChatRef::from(BOB));
    env.engine.choose_word(BOB, "sun");

    env.engine.shutdown().await;

    assert_eq!(env.engine.active_sessions(), 0);
    assert!(env.quiet_for(TWO_WEEKS).await);
}

#[tokio::test(start_paused = true)]
async fn test_notices_go_to_the_starting_chat() {
    let mut env = env_with_words();
    let group = ChatRef(-100500);
    env.engine.begin(ANN, group);
    env.engine.choose_word(ANN, "dog");

    assert_eq!(
        env.next_delivery().await,
        Delivery {
            user: ANN,
            chat: group,
            notice: reminder("dog", 1)
        }
    );

    env.engine.submit_answer(ANN, "собака");
    env.store.remove_word(ANN, "dog").unwrap();
    assert_eq!(
        env.next_delivery().await,
        Delivery {
            user: ANN,
            chat: group,
            notice: Notice::WordRemoved {
                word: "dog".to_string()
            }
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_answer_after_whole_dictionary_is_gone() {
    let mut env = TestEnv::new(FakeModel::answering("unused"));
    env.store.add_meaning(ANN, "dog", "собака").unwrap();
    env.engine.begin(ANN, ChatRef::from(ANN));
    env.engine.choose_word(ANN, "dog");
    assert_eq!(env.next_notice().await, (ANN, reminder("dog", 1)));

    env.store.remove_word(ANN, "dog").unwrap();
    assert!(env.store.snapshot().is_empty());

    assert_eq!(
        env.engine.submit_answer(ANN, "собака"),
        AnswerOutcome::WordRemoved {
            word: "dog".to_string()
        }
    );
    assert_eq!(env.engine.phase(ANN), None);
    assert_eq!(env.engine.active_sessions(), 0);
    assert!(env.quiet_for(TWO_WEEKS).await);
}
