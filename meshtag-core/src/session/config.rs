use std::time::Duration;

use crate::defaults::{DEFAULT_PROMPT_MESSAGE, DEFAULT_REPOLL_DELAY_MS};

/// Tunables for a [`crate::TagWriteSession`].
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SessionConfig {
    /// How long to wait before polling again after several tags were presented.
    pub repoll_delay_ms: u64,
    /// Prompt shown while waiting for a tag.
    pub prompt_message: String,
}

impl SessionConfig {
    pub(crate) const fn repoll_delay(&self) -> Duration {
        Duration::from_millis(self.repoll_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            repoll_delay_ms: DEFAULT_REPOLL_DELAY_MS,
            prompt_message: DEFAULT_PROMPT_MESSAGE.to_string(),
        }
    }
}

/// Returns the default [`SessionConfig`].
#[uniffi::export]
#[must_use]
pub fn default_session_config() -> SessionConfig {
    SessionConfig::default()
}
