//! JSON file state store.
//!
//! The record lives in a single JSON file. Reads tolerate a missing or
//! corrupt file by falling back to the default record — the first successful
//! save afterwards re-establishes a valid one. Writes go to a sibling temp
//! file and are renamed into place, so a crash mid-save leaves the previous
//! record intact.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tombola_core::{LotteryState, StateStore, StoreError};
use tracing::warn;

/// Filesystem-backed state store.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store persisting to the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone();
        tmp.set_extension("json.tmp");
        tmp
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<LotteryState, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LotteryState::default());
            }
            Err(e) => {
                return Err(StoreError::ReadFailed(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "state file unparseable, falling back to default record"
                );
                Ok(LotteryState::default())
            }
        }
    }

    async fn save(&self, state: &LotteryState) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| StoreError::WriteFailed(format!("serialize failed: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::WriteFailed(format!("failed to create directory: {e}"))
                })?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, &json)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            StoreError::WriteFailed(format!(
                "failed to move state into place at {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(())
    }
}
