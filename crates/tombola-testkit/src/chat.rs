//! Scripted chat platform mock.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tombola_core::{ChannelId, ChatEffects, ChatError, MessageRef, Reactor, UserId};

#[derive(Default)]
struct ChatScript {
    sent: Vec<(ChannelId, String)>,
    reactions: HashMap<u64, Vec<Reactor>>,
    deleted: HashSet<u64>,
    admins: HashSet<UserId>,
    flagged: HashSet<UserId>,
    handles: HashMap<UserId, String>,
}

/// In-memory chat platform with scripted reactions and permissions.
///
/// Message ids are handed out sequentially starting at 1, so a test can
/// predict the ref returned by the first send. Cloning shares the underlying
/// script, letting the test keep a handle to the mock it passed into the
/// engine.
#[derive(Clone, Default)]
pub struct MockChat {
    script: Arc<Mutex<ChatScript>>,
    next_message_id: Arc<AtomicU64>,
    fail_sends: Arc<AtomicBool>,
}

impl MockChat {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(ChatScript::default())),
            next_message_id: Arc::new(AtomicU64::new(1)),
            fail_sends: Arc::new(AtomicBool::new(false)),
        }
    }

    // Test infrastructure: a poisoned lock means the test already failed.
    #[allow(clippy::unwrap_used)]
    fn locked(&self) -> std::sync::MutexGuard<'_, ChatScript> {
        self.script.lock().unwrap()
    }

    /// Script the reactor list of a message.
    pub fn set_reactors(&self, message: MessageRef, reactors: Vec<Reactor>) {
        self.locked().reactions.insert(message.message, reactors);
    }

    /// Convenience: script `users` as non-bot reactors of `message`.
    pub fn react(&self, message: MessageRef, users: &[u64]) {
        let reactors = users
            .iter()
            .map(|&id| Reactor {
                user: UserId(id),
                is_bot: false,
            })
            .collect();
        self.set_reactors(message, reactors);
    }

    /// Make a message unresolvable from now on.
    pub fn delete_message(&self, message: MessageRef) {
        self.locked().deleted.insert(message.message);
    }

    /// Grant administrator privilege to a user.
    pub fn grant_admin(&self, user: UserId) {
        self.locked().admins.insert(user);
    }

    /// Mark a user as holding the flagged status (alternate medium reward).
    pub fn set_flagged(&self, user: UserId) {
        self.locked().flagged.insert(user);
    }

    /// Register a display handle for a user.
    pub fn set_handle(&self, user: UserId, handle: &str) {
        self.locked().handles.insert(user, handle.to_string());
    }

    /// Make every subsequent send fail (transient-outage simulation).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Number of messages sent so far.
    pub fn sent_count(&self) -> usize {
        self.locked().sent.len()
    }

    /// Contents of every message sent so far, in order.
    pub fn sent_messages(&self) -> Vec<String> {
        self.locked().sent.iter().map(|(_, c)| c.clone()).collect()
    }

    /// Content of the most recent message, if any.
    pub fn last_message(&self) -> Option<String> {
        self.locked().sent.last().map(|(_, c)| c.clone())
    }
}

#[async_trait]
impl ChatEffects for MockChat {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageRef, ChatError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChatError::Unavailable("scripted outage".into()));
        }
        let message = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.locked().sent.push((channel, content.to_string()));
        Ok(MessageRef { channel, message })
    }

    async fn fetch_message(&self, message: MessageRef) -> Result<Option<MessageRef>, ChatError> {
        let script = self.locked();
        let exists = message.message < self.next_message_id.load(Ordering::SeqCst)
            && !script.deleted.contains(&message.message);
        Ok(exists.then_some(message))
    }

    async fn list_reactors(
        &self,
        message: MessageRef,
        _marker: &str,
    ) -> Result<Vec<Reactor>, ChatError> {
        let script = self.locked();
        if script.deleted.contains(&message.message) {
            return Ok(Vec::new());
        }
        Ok(script
            .reactions
            .get(&message.message)
            .cloned()
            .unwrap_or_default())
    }

    async fn resolve_user(&self, user: UserId) -> Result<Option<String>, ChatError> {
        Ok(self.locked().handles.get(&user).cloned())
    }

    async fn is_administrator(&self, user: UserId) -> Result<bool, ChatError> {
        Ok(self.locked().admins.contains(&user))
    }

    async fn has_flagged_status(&self, user: UserId) -> Result<bool, ChatError> {
        Ok(self.locked().flagged.contains(&user))
    }
}
