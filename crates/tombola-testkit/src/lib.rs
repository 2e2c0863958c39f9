//! # Tombola Testkit - Deterministic Mock Handlers
//!
//! Complete in-memory implementations of the `tombola-core` effect traits
//! with predictable behavior: a scripted chat platform, a controllable clock,
//! an in-memory state store with failure injection, and seeded RNG helpers.
//!
//! # Blocking Lock Usage
//!
//! Uses `std::sync::Mutex` throughout: this is test infrastructure, locks
//! are held for simple map operations, and the synchronous API keeps test
//! code clear.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chat;
mod clock;
mod store;

pub use chat::MockChat;
pub use clock::ManualClock;
pub use store::MemoryStore;

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Deterministic RNG for reproducible draws in tests.
pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}
