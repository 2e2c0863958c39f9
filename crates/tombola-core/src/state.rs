//! The persisted lottery state record.
//!
//! One record per lottery, created with default values when no backing store
//! exists yet. Every phase transition mutates it and persists it immediately.
//! The earlier ad hoc flag set (nullable message id, "accepting" boolean) is
//! collapsed into the explicit [`Phase`] enum so contradictory combinations
//! cannot be represented.

use crate::week::WeekKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a chat platform account.
///
/// Serialized as a string: snowflake-style ids exceed the integer range some
/// JSON readers preserve exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(pub u64);

impl UserId {
    /// Mention form understood by the chat platform even when the account
    /// can no longer be resolved to a handle.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse().map(UserId)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0.to_string()
    }
}

/// Identifier of the channel the raffle runs in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a message previously posted to the chat platform.
///
/// May stop resolving at any time (message deleted, history truncated); the
/// lifecycle treats a stale reference as "zero participants", never as an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Channel the message was posted to.
    pub channel: ChannelId,
    /// Platform message id within that channel.
    pub message: u64,
}

/// Current position of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before the first open, or after an announced/aborted cycle.
    #[default]
    Idle,
    /// Entry window is open; users may still react.
    Open,
    /// Entries locked, winner (if any) drawn, announcement pending.
    Closed,
}

/// The single process-wide raffle record.
///
/// All fields carry `#[serde(default)]` so records written by older schema
/// versions merge forward: missing fields take their documented defaults and
/// unknown fields are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryState {
    /// Number of the next edition to be opened; strictly increases by one
    /// each time `open` succeeds.
    #[serde(default = "default_edition")]
    pub edition: u64,

    /// Lifecycle phase.
    #[serde(default)]
    pub phase: Phase,

    /// Reference to the currently-open entry announcement. Set iff `phase`
    /// is `Open` or `Closed`; cleared by `announce`.
    #[serde(default)]
    pub open_entry_ref: Option<MessageRef>,

    /// Distinct entrants of the current cycle. Populated by `close`, cleared
    /// at the start of the next `open`.
    #[serde(default)]
    pub participants: BTreeSet<UserId>,

    /// Winner chosen by `close`, consumed and cleared by `announce`.
    #[serde(default)]
    pub pending_winner: Option<UserId>,

    /// Per-user progression level in 1..=3. An absent entry means level 1:
    /// the level the user will win at next.
    #[serde(default)]
    pub levels: BTreeMap<UserId, u8>,

    /// Lifetime win counts; monotonically increasing, never reset outside an
    /// explicit admin override.
    #[serde(default)]
    pub total_wins: BTreeMap<UserId, u64>,

    /// Number of completed 1→2→3 cycles per user.
    #[serde(default)]
    pub cycle_count: BTreeMap<UserId, u64>,

    /// Unix timestamp (seconds) of each user's most recent win; consumed by
    /// the weighted selection policy.
    #[serde(default)]
    pub last_win_at: BTreeMap<UserId, i64>,

    /// ISO week in which `open` last ran to completion.
    #[serde(default)]
    pub last_open_week: Option<WeekKey>,

    /// ISO week in which `close` last ran to completion.
    #[serde(default)]
    pub last_close_week: Option<WeekKey>,

    /// ISO week in which `announce` last ran to completion.
    #[serde(default)]
    pub last_announce_week: Option<WeekKey>,
}

fn default_edition() -> u64 {
    1
}

impl Default for LotteryState {
    fn default() -> Self {
        Self {
            edition: 1,
            phase: Phase::Idle,
            open_entry_ref: None,
            participants: BTreeSet::new(),
            pending_winner: None,
            levels: BTreeMap::new(),
            total_wins: BTreeMap::new(),
            cycle_count: BTreeMap::new(),
            last_win_at: BTreeMap::new(),
            last_open_week: None,
            last_close_week: None,
            last_announce_week: None,
        }
    }
}

impl LotteryState {
    /// Current level of a user; absent entries are level 1.
    pub fn level_of(&self, user: UserId) -> u8 {
        self.levels.get(&user).copied().unwrap_or(1)
    }

    /// Lifetime win count of a user.
    pub fn wins_of(&self, user: UserId) -> u64 {
        self.total_wins.get(&user).copied().unwrap_or(0)
    }

    /// Remove every trace of a user from the history maps. Does not touch
    /// the current cycle's participant set.
    pub fn remove_user_history(&mut self, user: UserId) {
        self.levels.remove(&user);
        self.total_wins.remove(&user);
        self.cycle_count.remove(&user);
        self.last_win_at.remove(&user);
    }

    /// Reinitialize the lifecycle fields, keeping or discarding the history
    /// maps depending on `keep_history`.
    pub fn reset(&mut self, keep_history: bool) {
        self.edition = 1;
        self.phase = Phase::Idle;
        self.open_entry_ref = None;
        self.participants.clear();
        self.pending_winner = None;
        self.last_open_week = None;
        self.last_close_week = None;
        self.last_announce_week = None;
        if !keep_history {
            self.levels.clear();
            self.total_wins.clear();
            self.cycle_count.clear();
            self.last_win_at.clear();
        }
    }

    /// Structural invariants of the record. Exercised by tests after every
    /// transition; violations indicate a lifecycle bug, not bad input.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.edition == 0 {
            return Err("edition must be >= 1".into());
        }
        let has_ref = self.open_entry_ref.is_some();
        let expects_ref = matches!(self.phase, Phase::Open | Phase::Closed);
        if has_ref != expects_ref {
            return Err(format!(
                "open_entry_ref {} but phase is {:?}",
                if has_ref { "set" } else { "unset" },
                self.phase
            ));
        }
        if self.pending_winner.is_some() && self.phase != Phase::Closed {
            return Err(format!(
                "pending_winner set outside Closed (phase {:?})",
                self.phase
            ));
        }
        if let Some(winner) = self.pending_winner {
            if !self.participants.contains(&winner) {
                return Err(format!("pending winner {winner} not in participant set"));
            }
        }
        for (user, level) in &self.levels {
            if !(1..=3).contains(level) {
                return Err(format!("level {level} out of range for {user}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_bootstrap() {
        let state = LotteryState::default();
        assert_eq!(state.edition, 1);
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.open_entry_ref.is_none());
        assert!(state.participants.is_empty());
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn serde_round_trip_preserves_record() {
        let mut state = LotteryState::default();
        state.edition = 7;
        state.phase = Phase::Closed;
        state.open_entry_ref = Some(MessageRef {
            channel: ChannelId(10),
            message: 999,
        });
        state.participants.insert(UserId(1));
        state.participants.insert(UserId(2));
        state.pending_winner = Some(UserId(2));
        state.levels.insert(UserId(2), 3);
        state.total_wins.insert(UserId(2), 5);
        state.cycle_count.insert(UserId(2), 1);
        state.last_win_at.insert(UserId(2), 1_700_000_000);
        state.last_close_week = "2025-W43".parse().ok();

        let json = serde_json::to_string(&state).unwrap();
        let back: LotteryState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        // Re-serializing yields the same document.
        assert_eq!(serde_json::to_string(&back).unwrap(), json);
    }

    #[test]
    fn user_ids_serialize_as_strings() {
        let json = serde_json::to_string(&UserId(42)).unwrap();
        assert_eq!(json, "\"42\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UserId(42));
    }

    #[test]
    fn missing_fields_take_defaults() {
        // A record written before the watchdog keys and history maps existed.
        let legacy = r#"{"edition": 4, "phase": "open",
            "open_entry_ref": {"channel": 1, "message": 2}}"#;
        let state: LotteryState = serde_json::from_str(legacy).unwrap();
        assert_eq!(state.edition, 4);
        assert_eq!(state.phase, Phase::Open);
        assert!(state.levels.is_empty());
        assert!(state.last_open_week.is_none());
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let future = r#"{"edition": 2, "phase": "idle", "shiny_new_field": true}"#;
        let state: LotteryState = serde_json::from_str(future).unwrap();
        assert_eq!(state.edition, 2);
    }

    #[test]
    fn invariants_reject_contradictory_flags() {
        let mut state = LotteryState::default();
        state.open_entry_ref = Some(MessageRef {
            channel: ChannelId(1),
            message: 1,
        });
        assert!(state.check_invariants().is_err());

        let mut state = LotteryState::default();
        state.pending_winner = Some(UserId(9));
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn reset_soft_keeps_history() {
        let mut state = LotteryState::default();
        state.edition = 12;
        state.levels.insert(UserId(1), 2);
        state.total_wins.insert(UserId(1), 4);
        state.reset(true);
        assert_eq!(state.edition, 1);
        assert_eq!(state.level_of(UserId(1)), 2);

        state.reset(false);
        assert_eq!(state.level_of(UserId(1)), 1);
        assert_eq!(state.wins_of(UserId(1)), 0);
    }
}
