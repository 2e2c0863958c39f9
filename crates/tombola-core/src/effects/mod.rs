//! Effect trait definitions.
//!
//! The engine consumes the outside world through these seams only: the chat
//! platform, the state backing store, and the wall clock. Production handlers
//! live in `tombola-effects`; deterministic mocks live in `tombola-testkit`.

mod chat;
mod clock;
mod store;

pub use chat::{ChatEffects, ChatError, Reactor};
pub use clock::Clock;
pub use store::{StateStore, StoreError};
