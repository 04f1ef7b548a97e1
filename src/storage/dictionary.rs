//! Per-user word dictionaries with write-through JSON persistence
//!
//! The whole dictionary lives in memory and is written to a single JSON file
//! after every mutation:
//!
//! ```json
//! { "123456789": { "cat": ["кот", "кошка"], "dog": ["собака"] } }
//! ```
//!
//! Writes go to a temp file that is renamed over the target, so a crash never
//! leaves a half-written dictionary behind. A failed write rolls the in-memory
//! change back.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::error::{AppError, AppResult};
use crate::core::types::UserId;

/// One user's words, each with its meanings in insertion order
pub type WordBook = BTreeMap<String, Vec<String>>;

/// Every user's dictionary, exactly as persisted
pub type Snapshot = BTreeMap<UserId, WordBook>;

/// Result of [`DictionaryStore::add_meaning`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

/// Result of [`DictionaryStore::remove_meaning`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeaningRemoval {
    /// The word still has other meanings
    MeaningRemoved,
    /// That was the last meaning, so the word is gone too
    WordRemoved,
}

/// Process-wide dictionary store
///
/// Mutations hold a synchronous lock for the whole read-modify-persist
/// sequence and never across an `.await`, so two commands from the same user
/// cannot interleave and snapshots reach the disk in mutation order.
pub struct DictionaryStore {
    path: Option<PathBuf>,
    data: Mutex<Snapshot>,
}

impl DictionaryStore {
    /// Loads the dictionary file, or starts empty if it does not exist yet
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }

        let data = if path.exists() {
            read_snapshot(&path)?
        } else {
            log::info!("Dictionary file {} not found, starting empty", path.display());
            Snapshot::new()
        };

        log_loaded(&path, &data);
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    /// Loads an existing dictionary file for inspection
    ///
    /// Nothing is created on disk and mutations are never persisted.
    ///
    /// # Errors
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn open_read_only(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let data = read_snapshot(path)?;
        log_loaded(path, &data);

        Ok(Self {
            path: None,
            data: Mutex::new(data),
        })
    }

    /// Store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(Snapshot::new()),
        }
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        // A panic elsewhere must not take the whole dictionary down with it
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `meaning` to `word`, creating the word and the user's book as needed
    pub fn add_meaning(&self, user: UserId, word: &str, meaning: &str) -> AppResult<AddOutcome> {
        self.mutate(user, |book| {
            let meanings = book.entry(word.to_string()).or_default();
            if meanings.iter().any(|m| m == meaning) {
                return Ok((AddOutcome::AlreadyExists, false));
            }
            meanings.push(meaning.to_string());
            Ok((AddOutcome::Added, true))
        })
    }

    /// Deletes a word with all its meanings
    pub fn remove_word(&self, user: UserId, word: &str) -> AppResult<()> {
        self.mutate(user, |book| match book.remove(word) {
            Some(_) => Ok(((), true)),
            None => Err(AppError::WordNotFound(word.to_string())),
        })
    }

    /// Deletes one meaning; the word goes with its last meaning
    pub fn remove_meaning(&self, user: UserId, word: &str, meaning: &str) -> AppResult<MeaningRemoval> {
        self.mutate(user, |book| {
            let meanings = book
                .get_mut(word)
                .ok_or_else(|| AppError::WordNotFound(word.to_string()))?;

            let index =
                meanings
                    .iter()
                    .position(|m| m == meaning)
                    .ok_or_else(|| AppError::MeaningNotFound {
                        word: word.to_string(),
                        meaning: meaning.to_string(),
                    })?;
            meanings.remove(index);

            if meanings.is_empty() {
                book.remove(word);
                Ok((MeaningRemoval::WordRemoved, true))
            } else {
                Ok((MeaningRemoval::MeaningRemoved, true))
            }
        })
    }

    /// All of the user's words sorted ascending, meanings in insertion order
    pub fn list_words(&self, user: UserId) -> Vec<(String, Vec<String>)> {
        self.lock()
            .get(&user)
            .map(|book| book.iter().map(|(w, m)| (w.clone(), m.clone())).collect())
            .unwrap_or_default()
    }

    pub fn has_word(&self, user: UserId, word: &str) -> bool {
        self.lock().get(&user).is_some_and(|book| book.contains_key(word))
    }

    pub fn meanings_of(&self, user: UserId, word: &str) -> Option<Vec<String>> {
        self.lock().get(&user).and_then(|book| book.get(word).cloned())
    }

    pub fn word_count(&self, user: UserId) -> usize {
        self.lock().get(&user).map(BTreeMap::len).unwrap_or(0)
    }

    /// Copy of everything, for inspection tools
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    /// Applies `f` to a copy of the user's book and commits it only if the
    /// new snapshot was persisted.
    ///
    /// `f` returns the operation's result and whether anything changed.
    fn mutate<T>(&self, user: UserId, f: impl FnOnce(&mut WordBook) -> AppResult<(T, bool)>) -> AppResult<T> {
        let mut data = self.lock();

        let previous = data.get(&user).cloned();
        let mut book = previous.clone().unwrap_or_default();
        let (outcome, changed) = f(&mut book)?;
        if !changed {
            return Ok(outcome);
        }

        if book.is_empty() {
            data.remove(&user);
        } else {
            data.insert(user, book);
        }

        if let Err(e) = self.persist(&data) {
            match previous {
                Some(book) => data.insert(user, book),
                None => data.remove(&user),
            };
            log::error!("Dictionary change for user {} rolled back: {}", user, e);
            return Err(e);
        }

        Ok(outcome)
    }

    fn persist(&self, data: &Snapshot) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(data)?;
        write_atomically(path, &json).map_err(|source| AppError::Persistence {
            path: path.clone(),
            source,
        })
    }
}

fn read_snapshot(path: &Path) -> AppResult<Snapshot> {
    let raw = fs_err::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Snapshot::new());
    }
    let mut data: Snapshot = serde_json::from_str(&raw)?;
    drop_empty_entries(&mut data);
    Ok(data)
}

fn log_loaded(path: &Path, data: &Snapshot) {
    log::info!(
        "Loaded dictionary from {}: {} user(s), {} word(s)",
        path.display(),
        data.len(),
        data.values().map(BTreeMap::len).sum::<usize>()
    );
}

/// Loaded files may predate the "no empty words" rule
fn drop_empty_entries(data: &mut Snapshot) {
    for (user, book) in data.iter_mut() {
        let before = book.len();
        book.retain(|_, meanings| !meanings.is_empty());
        if book.len() != before {
            log::warn!("Dropped {} empty word(s) for user {}", before - book.len(), user);
        }
    }
    data.retain(|_, book| !book.is_empty());
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let temp_path = PathBuf::from(format!("{}.tmp.{}", path.display(), std::process::id()));

    let write_result = (|| {
        let mut file = fs_err::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    })();

    if let Err(e) = write_result.and_then(|()| fs_err::rename(&temp_path, path)) {
        // Clean up temp file on failure
        let _ = fs_err::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}
