//! Error types for the raffle engine.

use crate::state::UserId;
use thiserror::Error;

/// Raffle error types.
#[derive(Debug, Error)]
pub enum LotteryError {
    /// Chat platform call failed (send, fetch, reaction enumeration).
    #[error("Chat platform failed: {0}")]
    Chat(String),

    /// State store load/save failed.
    #[error("State store failed: {0}")]
    Store(String),

    /// Caller lacks administrator privilege for an override command.
    #[error("Not authorized")]
    Unauthorized,

    /// Edition numbers start at 1.
    #[error("Invalid edition {0}: must be >= 1")]
    InvalidEdition(u64),

    /// Progression levels are 1..=3.
    #[error("Invalid level {0}: must be between 1 and 3")]
    InvalidLevel(u8),

    /// Referenced user has no recorded history.
    #[error("No history recorded for user {0}")]
    UnknownUser(UserId),

    /// Engine configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<crate::effects::ChatError> for LotteryError {
    fn from(err: crate::effects::ChatError) -> Self {
        Self::Chat(err.to_string())
    }
}

impl From<crate::effects::StoreError> for LotteryError {
    fn from(err: crate::effects::StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

/// Result type for raffle operations.
pub type Result<T> = std::result::Result<T, LotteryError>;
