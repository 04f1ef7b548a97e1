use std::time::Duration;

use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// Waits between successive reminders of one learning session
///
/// Never empty, and each delay is at least as long as the one before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    delays: Vec<Duration>,
}

impl Schedule {
    pub fn new(delays: Vec<Duration>) -> AppResult<Self> {
        if delays.is_empty() {
            return Err(AppError::Config("learning schedule must have at least one delay".to_string()));
        }
        if let Some(pair) = delays.windows(2).find(|w| w[1] < w[0]) {
            return Err(AppError::Config(format!(
                "learning schedule must not decrease ({:?} is followed by {:?})",
                pair[0], pair[1]
            )));
        }
        Ok(Self { delays })
    }

    /// Parses comma-separated seconds, e.g. `"60, 120, 3600"`
    pub fn parse_secs(raw: &str) -> AppResult<Self> {
        let delays = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| AppError::Config(format!("invalid delay '{}': {}", part, e)))
            })
            .collect::<AppResult<Vec<_>>>()?;
        Self::new(delays)
    }

    /// `LEARNING_SCHEDULE_SECS` if set, the default otherwise
    pub fn from_env() -> AppResult<Self> {
        match config::learning::SCHEDULE_OVERRIDE.as_deref() {
            Some(raw) => Self::parse_secs(raw),
            None => Ok(Self::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    pub fn delay(&self, step: usize) -> Option<Duration> {
        self.delays.get(step).copied()
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            delays: config::learning::default_delays(),
        }
    }
}
