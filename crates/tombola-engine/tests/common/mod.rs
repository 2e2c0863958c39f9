//! Shared harness for the engine integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tombola_core::{ChannelId, LotteryState};
use tombola_engine::{EngineConfig, LotteryLifecycle};
use tombola_testkit::{ManualClock, MemoryStore, MockChat};

pub const CHANNEL: ChannelId = ChannelId(99);

pub fn config() -> EngineConfig {
    EngineConfig {
        channel: CHANNEL,
        ..EngineConfig::default()
    }
}

/// Wednesday 2025-10-22 11:00 local (UTC+1), ISO week 2025-W43: the entry
/// window's open slot has passed, close has not.
pub fn wednesday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 22, 10, 0, 0).single().unwrap()
}

pub struct Harness {
    pub chat: MockChat,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub lifecycle: Arc<LotteryLifecycle>,
}

pub async fn harness(config: EngineConfig, state: Option<LotteryState>) -> Harness {
    // Engine traces show up under RUST_LOG when a test fails.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let chat = MockChat::new();
    let store = match state {
        Some(state) => MemoryStore::with_state(state),
        None => MemoryStore::new(),
    };
    let clock = ManualClock::at(wednesday());
    let lifecycle = LotteryLifecycle::bootstrap_seeded(
        Arc::new(chat.clone()),
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
        config,
        42,
    )
    .await
    .unwrap();
    Harness {
        chat,
        store,
        clock,
        lifecycle: Arc::new(lifecycle),
    }
}

pub async fn default_harness() -> Harness {
    harness(config(), None).await
}
