//! Language-model collaborator
//!
//! Free-form questions go through two calls: exchange the long-lived
//! credential for a short-lived bearer token, then ask the completion
//! endpoint. [`LanguageModel`] is the seam the router talks to.

pub mod yandex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::core::error::{AppError, AppResult};

pub use yandex::YandexGpt;

/// Short-lived bearer token
pub struct AuthToken {
    secret: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            expires_at,
        }
    }

    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Still usable for at least `margin` more seconds
    ///
    /// Tokens without an expiry are never reused.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        self.expires_at
            .is_some_and(|expires| expires - chrono::Duration::seconds(margin_secs) > now)
    }
}

impl Clone for AuthToken {
    fn clone(&self) -> Self {
        Self::new(self.expose(), self.expires_at)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn fetch_auth_token(&self) -> AppResult<AuthToken>;

    async fn ask(&self, text: &str, token: &AuthToken) -> AppResult<String>;
}

/// Stand-in used when no credentials are configured
pub struct Unconfigured;

#[async_trait]
impl LanguageModel for Unconfigured {
    async fn fetch_auth_token(&self) -> AppResult<AuthToken> {
        Err(AppError::Config("language model credentials are not set".to_string()))
    }

    async fn ask(&self, _text: &str, _token: &AuthToken) -> AppResult<String> {
        Err(AppError::Config("language model credentials are not set".to_string()))
    }
}
