//! In-memory state store with failure injection.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tombola_core::{LotteryState, StateStore, StoreError};

/// State store holding the record in memory.
///
/// Starts empty (loads the default record) unless seeded with
/// [`MemoryStore::with_state`]. Save failures can be injected to exercise
/// the abort-without-partial-mutation paths.
#[derive(Clone, Default)]
pub struct MemoryStore {
    record: Arc<Mutex<Option<LotteryState>>>,
    fail_saves: Arc<AtomicBool>,
    save_count: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a record.
    pub fn with_state(state: LotteryState) -> Self {
        let store = Self::new();
        *store.locked() = Some(state);
        store
    }

    // Test infrastructure: a poisoned lock means the test already failed.
    #[allow(clippy::unwrap_used)]
    fn locked(&self) -> std::sync::MutexGuard<'_, Option<LotteryState>> {
        self.record.lock().unwrap()
    }

    /// Make every subsequent save fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// The record as last persisted, if any save has happened.
    pub fn persisted(&self) -> Option<LotteryState> {
        self.locked().clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<LotteryState, StoreError> {
        Ok(self.locked().clone().unwrap_or_default())
    }

    async fn save(&self, state: &LotteryState) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("scripted save failure".into()));
        }
        *self.locked() = Some(state.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
