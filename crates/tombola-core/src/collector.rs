//! Participant enumeration over the entry announcement's reactions.

use crate::effects::{ChatEffects, ChatError};
use crate::state::{MessageRef, UserId};
use std::collections::BTreeSet;
use tracing::debug;

/// Distinct non-bot accounts that applied `marker` to the entry
/// announcement.
///
/// A reference that no longer resolves yields the empty set: a deleted
/// announcement means a week with no valid entrants, not a failure. Only
/// transport errors propagate.
pub async fn collect_participants(
    chat: &dyn ChatEffects,
    entry: MessageRef,
    marker: &str,
) -> Result<BTreeSet<UserId>, ChatError> {
    if chat.fetch_message(entry).await?.is_none() {
        debug!(?entry, "entry announcement no longer resolves, zero entrants");
        return Ok(BTreeSet::new());
    }

    let reactors = chat.list_reactors(entry, marker).await?;
    Ok(reactors
        .into_iter()
        .filter(|r| !r.is_bot)
        .map(|r| r.user)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Reactor;
    use crate::state::ChannelId;
    use async_trait::async_trait;

    struct FixedReactions {
        resolves: bool,
        reactors: Vec<Reactor>,
    }

    #[async_trait]
    impl ChatEffects for FixedReactions {
        async fn send_message(
            &self,
            channel: ChannelId,
            _content: &str,
        ) -> Result<MessageRef, ChatError> {
            Ok(MessageRef {
                channel,
                message: 0,
            })
        }

        async fn fetch_message(
            &self,
            message: MessageRef,
        ) -> Result<Option<MessageRef>, ChatError> {
            Ok(self.resolves.then_some(message))
        }

        async fn list_reactors(
            &self,
            _message: MessageRef,
            _marker: &str,
        ) -> Result<Vec<Reactor>, ChatError> {
            Ok(self.reactors.clone())
        }

        async fn resolve_user(&self, _user: UserId) -> Result<Option<String>, ChatError> {
            Ok(None)
        }

        async fn is_administrator(&self, _user: UserId) -> Result<bool, ChatError> {
            Ok(false)
        }

        async fn has_flagged_status(&self, _user: UserId) -> Result<bool, ChatError> {
            Ok(false)
        }
    }

    fn entry() -> MessageRef {
        MessageRef {
            channel: ChannelId(1),
            message: 77,
        }
    }

    fn reactor(id: u64, is_bot: bool) -> Reactor {
        Reactor {
            user: UserId(id),
            is_bot,
        }
    }

    #[tokio::test]
    async fn dedupes_and_drops_bots() {
        let chat = FixedReactions {
            resolves: true,
            reactors: vec![
                reactor(1, false),
                reactor(2, true),
                reactor(3, false),
                // Same account reacting twice collapses to one entry.
                reactor(1, false),
            ],
        };
        let set = collect_participants(&chat, entry(), "\u{2705}").await.unwrap();
        assert_eq!(set, [UserId(1), UserId(3)].into_iter().collect());
    }

    #[tokio::test]
    async fn stale_reference_yields_empty_set() {
        let chat = FixedReactions {
            resolves: false,
            reactors: vec![reactor(1, false)],
        };
        let set = collect_participants(&chat, entry(), "\u{2705}").await.unwrap();
        assert!(set.is_empty());
    }
}
