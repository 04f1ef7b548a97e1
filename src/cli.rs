use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::core::error::AppResult;
use crate::core::types::UserId;
use crate::storage::DictionaryStore;
use crate::telegram::messages;

#[derive(Parser)]
#[command(name = "wordkeeper")]
#[command(author, version, about = "Telegram bot that keeps your vocabulary and helps you repeat it", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling (default)
    Run,

    /// Print one user's dictionary from the store file
    Show {
        /// Telegram user id
        #[arg(short, long)]
        user: UserId,

        /// Dictionary file (defaults to DICTIONARY_PATH)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Validate the store file and print a summary
    CheckStore {
        /// Dictionary file (defaults to DICTIONARY_PATH)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Renders one user's dictionary from the store file
pub fn show_dictionary(path: &Path, user: UserId) -> AppResult<String> {
    let store = DictionaryStore::open_read_only(path)?;
    let words = store.list_words(user);
    if words.is_empty() {
        return Ok(format!("User {} has no words", user));
    }
    Ok(messages::dictionary_lines(&words))
}

/// Loads the store and counts users, words and meanings; a missing file is an error
pub fn check_store(path: &Path) -> AppResult<String> {
    let store = DictionaryStore::open_read_only(path)?;
    let snapshot = store.snapshot();

    let users = snapshot.len();
    let words: usize = snapshot.values().map(|book| book.len()).sum();
    let meanings: usize = snapshot
        .values()
        .flat_map(|book| book.values())
        .map(Vec::len)
        .sum();

    Ok(format!(
        "{}: OK, {} user(s), {} word(s), {} meaning(s)",
        path.display(),
        users,
        words,
        meanings
    ))
}
