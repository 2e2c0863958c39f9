//! # Tombola Core - Raffle Domain Crate
//!
//! **Purpose**: Define the weekly raffle domain types, pure lifecycle logic,
//! and the effect traits the engine consumes.
//!
//! This crate holds everything that can be expressed without I/O:
//!
//! - **State record**: the single persisted [`LotteryState`] record — edition
//!   counter, lifecycle phase, participant set, per-user win history, and the
//!   watchdog week keys.
//! - **Prize ledger**: pure level-cycle arithmetic (1 → 2 → 3 → 1) and prize
//!   tier computation.
//! - **Selector**: uniform and weighted winner draws over a participant set.
//! - **Week keys**: ISO year-week identifiers and weekly slot arithmetic used
//!   by the scheduler's reconciliation pass.
//! - **Effect traits**: the chat platform, state store, and clock seams. The
//!   production handlers live in `tombola-effects`; deterministic mocks live
//!   in `tombola-testkit`.
//!
//! ## What's NOT in this crate
//!
//! - The lifecycle orchestrator and scheduler (`tombola-engine`)
//! - Effect handler implementations (`tombola-effects`)
//! - Message copy (`tombola-engine::messages`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Participant enumeration over the entry announcement's reactions
pub mod collector;

/// Effect trait definitions (chat platform, state store, clock)
pub mod effects;

/// Unified raffle error types
pub mod errors;

/// Pure win/level/prize arithmetic
pub mod ledger;

/// Winner selection policies
pub mod selector;

/// The persisted lottery state record
pub mod state;

/// ISO week keys and weekly slot arithmetic
pub mod week;

pub use collector::collect_participants;
pub use effects::{ChatEffects, ChatError, Clock, Reactor, StateStore, StoreError};
pub use errors::{LotteryError, Result};
pub use ledger::{derive_last_win, record_bonus_win, record_win, BonusRecord, PrizeTier, WinRecord};
pub use selector::{pick_one, pick_two_distinct, pick_weighted};
pub use state::{ChannelId, LotteryState, MessageRef, Phase, UserId};
pub use week::{Slot, WeekKey};
