//! Spaced-repetition scheduling

pub mod engine;
pub mod notifier;
pub mod schedule;

pub use engine::{AnswerOutcome, LearningEngine, Phase, WordChoice};
pub use notifier::{Notice, Notifier};
pub use schedule::Schedule;
