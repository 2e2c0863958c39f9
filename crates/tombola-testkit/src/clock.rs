//! Controllable clock for deterministic scheduling tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use tombola_core::Clock;

/// Clock frozen at a settable instant.
///
/// Cloning shares the instant, so a test can advance the clock it handed to
/// the scheduler.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    // Test infrastructure: a poisoned lock means the test already failed.
    #[allow(clippy::unwrap_used)]
    fn locked(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap()
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.locked() = now;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.locked();
        *now += by;
    }

    /// Current frozen instant.
    pub fn now(&self) -> DateTime<Utc> {
        *self.locked()
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn now_utc(&self) -> DateTime<Utc> {
        self.now()
    }
}
