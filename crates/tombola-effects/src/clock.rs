//! System wall clock handler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tombola_core::Clock;

/// Real clock delegating to the operating system.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for SystemClock {
    async fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
