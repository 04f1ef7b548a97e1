//! Configuration read once from the environment (after `.env` is loaded)

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Path of the JSON file holding every user's dictionary
/// Read from DICTIONARY_PATH environment variable
/// Default: user_dictionaries.json
pub static DICTIONARY_PATH: Lazy<String> =
    Lazy::new(|| env::var("DICTIONARY_PATH").unwrap_or_else(|_| "user_dictionaries.json".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: wordkeeper.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "wordkeeper.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Optional custom Bot API server
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("BOT_API_URL"));

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Spaced-repetition configuration
pub mod learning {
    use super::Duration;
    use once_cell::sync::Lazy;

    /// 1 min, 2 min, 1 hour, 1 day, 3 days, 1 week, 2 weeks
    pub const DEFAULT_SCHEDULE_SECS: [u64; 7] = [60, 120, 3_600, 86_400, 259_200, 604_800, 1_209_600];

    /// Raw override of the schedule, comma-separated seconds
    /// Read from LEARNING_SCHEDULE_SECS environment variable
    pub static SCHEDULE_OVERRIDE: Lazy<Option<String>> = Lazy::new(|| super::non_empty_var("LEARNING_SCHEDULE_SECS"));

    /// Default schedule as durations
    pub fn default_delays() -> Vec<Duration> {
        DEFAULT_SCHEDULE_SECS.iter().map(|s| Duration::from_secs(*s)).collect()
    }
}

/// Language model (YandexGPT) configuration
pub mod llm {
    use super::{non_empty_var, Duration};
    use once_cell::sync::Lazy;
    use std::env;

    pub const DEFAULT_IAM_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
    pub const DEFAULT_API_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

    pub const TEMPERATURE: f32 = 0.3;
    pub const MAX_TOKENS: u32 = 1000;

    pub const SYSTEM_PROMPT: &str = "I am learning foreign languages and I want you to explain the theory to me \
                                     and answer all my questions. Answer in English.";

    /// Refresh IAM tokens this long before they expire
    pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;

    /// Long-lived OAuth credential exchanged for IAM tokens
    /// Read from YANDEX_OAUTH_TOKEN (or OAUTH_TOKEN)
    pub static OAUTH_TOKEN: Lazy<Option<String>> =
        Lazy::new(|| non_empty_var("YANDEX_OAUTH_TOKEN").or_else(|| non_empty_var("OAUTH_TOKEN")));

    /// Cloud folder id used in the model URI
    /// Read from YANDEX_FOLDER_ID (or FOLDER_ID)
    pub static FOLDER_ID: Lazy<Option<String>> =
        Lazy::new(|| non_empty_var("YANDEX_FOLDER_ID").or_else(|| non_empty_var("FOLDER_ID")));

    /// Token endpoint
    pub static IAM_URL: Lazy<String> =
        Lazy::new(|| env::var("IAM_URL").unwrap_or_else(|_| DEFAULT_IAM_URL.to_string()));

    /// Completion endpoint
    pub static API_URL: Lazy<String> =
        Lazy::new(|| env::var("GPT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()));

    /// Request timeout for both endpoints (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

    /// Attempts at `getMe` while the Bot API is starting
    pub const STARTUP_MAX_RETRIES: u32 = 12;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_non_decreasing() {
        let delays = learning::default_delays();
        assert_eq!(delays.len(), 7);
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(delays[0], Duration::from_secs(60));
        assert_eq!(delays[6], Duration::from_secs(14 * 24 * 3600));
    }
}
