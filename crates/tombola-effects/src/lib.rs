//! # Tombola Effects - Production Handlers
//!
//! Stateless implementations of the effect traits defined in `tombola-core`,
//! delegating to the filesystem and the system clock. Mock handlers belong in
//! `tombola-testkit`, never here.
//!
//! The chat platform handler is deliberately absent: the engine is hosted by
//! whatever process owns the platform client, which implements
//! [`tombola_core::ChatEffects`] against its own connection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// System wall clock
pub mod clock;

/// JSON file state store
pub mod store;

pub use clock::SystemClock;
pub use store::FileStateStore;
