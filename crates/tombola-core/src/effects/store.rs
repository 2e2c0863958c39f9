//! State store effect trait.

use crate::state::LotteryState;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for state store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing storage could not be read. Missing or corrupt records are not
    /// errors — handlers fall back to the default record for those.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Backing storage could not be written.
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Load/save of the single persisted [`LotteryState`] record.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the record. A missing or unparseable backing store yields the
    /// default record; only a failing transport is an error.
    async fn load(&self) -> Result<LotteryState, StoreError>;

    /// Persist the record. The write must be atomic enough that a crash
    /// mid-save cannot leave a half-written record behind.
    async fn save(&self, state: &LotteryState) -> Result<(), StoreError>;
}
