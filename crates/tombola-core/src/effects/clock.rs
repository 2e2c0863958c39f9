//! Wall-clock effect trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
///
/// The scheduler converts to the configured fixed-offset local time itself;
/// handlers only ever report UTC.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    async fn now_utc(&self) -> DateTime<Utc>;
}
