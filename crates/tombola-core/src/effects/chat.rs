//! Chat platform effect trait.
//!
//! Everything the lifecycle needs from the chat platform, and nothing else:
//! post a message, check whether an earlier message still resolves, enumerate
//! reactions, resolve display handles, and answer the two permission/status
//! lookups the admin surface and prize copy depend on.
//!
//! Absence is data here, not failure: a deleted message is `Ok(None)`, an
//! unresolvable account is `Ok(None)`. The error channel carries transport
//! failures only.

use crate::state::{ChannelId, MessageRef, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for chat platform operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Outbound message could not be delivered.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Fetch/enumeration call failed (distinct from "message gone").
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Platform connection is down or rate limited.
    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// One account that applied the entry reaction to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reactor {
    /// The reacting account.
    pub user: UserId,
    /// Whether the platform flags the account as automated.
    pub is_bot: bool,
}

/// The chat platform seam.
#[async_trait]
pub trait ChatEffects: Send + Sync {
    /// Post `content` to `channel`, returning a reference to the new message.
    async fn send_message(&self, channel: ChannelId, content: &str)
        -> Result<MessageRef, ChatError>;

    /// Resolve a previously-posted message. `Ok(None)` means the message no
    /// longer exists (deleted, history truncated); not an error.
    async fn fetch_message(&self, message: MessageRef) -> Result<Option<MessageRef>, ChatError>;

    /// All accounts that applied the given reaction marker to a message,
    /// bots included; callers filter. Returns an empty list for a message
    /// that no longer resolves.
    async fn list_reactors(
        &self,
        message: MessageRef,
        marker: &str,
    ) -> Result<Vec<Reactor>, ChatError>;

    /// Displayable handle for a user, if the account still resolves.
    async fn resolve_user(&self, user: UserId) -> Result<Option<String>, ChatError>;

    /// Whether the user holds administrator privilege in the guild.
    async fn is_administrator(&self, user: UserId) -> Result<bool, ChatError>;

    /// Whether the user already holds the flagged status that swaps the
    /// medium prize for its alternate reward.
    async fn has_flagged_status(&self, user: UserId) -> Result<bool, ChatError>;
}
