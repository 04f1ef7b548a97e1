//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::UserId;

use crate::telegram::router::CommandRouter;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub router: Arc<CommandRouter>,
    pub bot_username: Option<String>,
    pub bot_id: UserId,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(router: Arc<CommandRouter>, bot_username: Option<String>, bot_id: UserId) -> Self {
        Self {
            router,
            bot_username,
            bot_id,
        }
    }
}
