//! Durable per-user dictionaries

pub mod dictionary;

// Re-exports for convenience
pub use dictionary::{AddOutcome, DictionaryStore, MeaningRemoval, Snapshot, WordBook};
