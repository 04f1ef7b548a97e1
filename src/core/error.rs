use std::path::PathBuf;

use thiserror::Error;

/// Centralized error types for the application
///
/// Every fallible operation in the library returns this enum. The router turns
/// the user-facing variants into reply text; the rest are logged.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed command arguments; carries the usage line
    #[error("Usage error: {0}")]
    Usage(String),

    /// The word is not in the user's dictionary
    #[error("Word not found: {0}")]
    WordNotFound(String),

    /// The word exists but does not have this meaning
    #[error("Meaning '{meaning}' not found for word '{word}'")]
    MeaningNotFound { word: String, meaning: String },

    /// Token or completion request returned something unusable
    #[error("External service error: {0}")]
    ExternalService(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing or reading the dictionary file failed
    #[error("Failed to persist dictionary to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Errors that are the user's doing rather than the bot's
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Usage(_) | AppError::WordNotFound(_) | AppError::MeaningNotFound { .. }
        )
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
