//! Engine runtime configuration.
//!
//! Loadable from TOML; every field has a default matching the standard
//! deployment (entry window Wednesday 00:00 → Thursday 00:00, announcement
//! Thursday 08:00, UTC+1).

use chrono::{DateTime, FixedOffset, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tombola_core::{ChannelId, LotteryError, Result, Slot};

/// Winner selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Unbiased uniform draw.
    #[default]
    Uniform,
    /// Staleness-weighted draw: the longer since a participant's last win,
    /// the higher their weight, with a boost for participants at the lowest
    /// current level.
    Weighted,
}

/// The three weekly phase slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Entry window opens.
    pub open: Slot,
    /// Entries lock and the winner is drawn.
    pub close: Slot,
    /// Result is published.
    pub announce: Slot,
}

impl Default for Schedule {
    fn default() -> Self {
        // Validated constants.
        #[allow(clippy::unwrap_used)]
        Self {
            open: Slot::new(Weekday::Wed, 0, 0).unwrap(),
            close: Slot::new(Weekday::Thu, 0, 0).unwrap(),
            announce: Slot::new(Weekday::Thu, 8, 0).unwrap(),
        }
    }
}

/// Engine configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Channel the raffle runs in.
    pub channel: ChannelId,

    /// Reaction marker entrants apply to the entry announcement.
    pub reaction_marker: String,

    /// Fixed UTC offset, in hours, the weekly slots are expressed in.
    pub utc_offset_hours: i8,

    /// Weekly phase slots.
    pub schedule: Schedule,

    /// Nothing fires before this instant (first official run gate).
    pub start_at: Option<DateTime<Utc>>,

    /// Editions run in bonus mode: the winner's progression is untouched and
    /// the reward is drawn from a fixed set instead.
    pub bonus_editions: Vec<u64>,

    /// Winner selection policy.
    pub selection: SelectionPolicy,

    /// Cap, in weeks, on the staleness factor of the weighted policy.
    pub staleness_cap_weeks: u32,

    /// Seconds between scheduler reconciliation passes.
    pub watchdog_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel: ChannelId(0),
            reaction_marker: "\u{2705}".to_string(),
            utc_offset_hours: 1,
            schedule: Schedule::default(),
            start_at: None,
            bonus_editions: Vec::new(),
            selection: SelectionPolicy::Uniform,
            staleness_cap_weeks: 8,
            watchdog_interval_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML, then validate it.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| LotteryError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the field ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.reaction_marker.is_empty() {
            return Err(LotteryError::InvalidConfig(
                "reaction_marker must not be empty".into(),
            ));
        }
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(LotteryError::InvalidConfig(format!(
                "utc_offset_hours {} out of range",
                self.utc_offset_hours
            )));
        }
        if self.watchdog_interval_secs == 0 {
            return Err(LotteryError::InvalidConfig(
                "watchdog_interval_secs must be >= 1".into(),
            ));
        }
        // Slot fields deserialize without going through Slot::new; re-check
        // their ranges here, else an out-of-range slot silently never fires.
        for (name, slot) in [
            ("open", &self.schedule.open),
            ("close", &self.schedule.close),
            ("announce", &self.schedule.announce),
        ] {
            Slot::new(slot.weekday, slot.hour, slot.minute)
                .map_err(|e| LotteryError::InvalidConfig(format!("schedule.{name}: {e}")))?;
        }
        Ok(())
    }

    /// The configured fixed offset.
    pub fn offset(&self) -> FixedOffset {
        // Range-checked by validate().
        #[allow(clippy::unwrap_used)]
        let offset = FixedOffset::east_opt(i32::from(self.utc_offset_hours) * 3600).unwrap();
        offset
    }

    /// Whether the given edition number runs in bonus mode.
    pub fn is_bonus_edition(&self, edition: u64) -> bool {
        self.bonus_editions.contains(&edition)
    }
}
