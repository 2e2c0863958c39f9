//! # Tombola Engine - Lifecycle Orchestration
//!
//! The weekly raffle lifecycle: `open` posts the entry announcement and
//! starts a new edition, `close` locks entries and draws the winner,
//! `announce` publishes the result. A clock-driven scheduler fires the three
//! phases at their weekly slots and reconciles missed firings through ISO
//! week keys, so a restart never double-runs or permanently skips a phase.
//!
//! The engine is a library: the hosting process owns the chat platform
//! connection and hands the engine implementations of the `tombola-core`
//! effect traits (production store and clock handlers live in
//! `tombola-effects`, deterministic mocks in `tombola-testkit`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Admin command surface
pub mod admin;

/// Engine runtime configuration
pub mod config;

/// The lifecycle state machine
pub mod lifecycle;

/// Announcement text rendering
pub mod messages;

/// Clock-driven phase firing and missed-tick reconciliation
pub mod scheduler;

pub use admin::{handle_admin, AdminCommand};
pub use config::{EngineConfig, Schedule, SelectionPolicy};
pub use lifecycle::{AnnounceOutcome, CloseOutcome, LotteryLifecycle, OpenOutcome};
pub use scheduler::{Scheduler, TickReport};
