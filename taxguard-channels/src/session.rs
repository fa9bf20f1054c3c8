//! In-memory conversation store keyed by sender.
//!
//! Every session starts with one system entry. After each append the
//! sequence is trimmed to the system entry plus the `window` most recent
//! turns. Append, trim, and snapshot happen under the sender's shard lock, so
//! concurrent turns from one sender interleave but never corrupt the window.
//! Sessions live for the process lifetime.

use dashmap::DashMap;

use crate::message::{Message, Role};

/// Per-sender conversation history.
pub struct ConversationStore {
    sessions: DashMap<String, Vec<Message>>,
    system_prompt: String,
    window: usize,
}

impl ConversationStore {
    /// Create a store seeding new sessions with `system_prompt`.
    ///
    /// A `window` of zero is treated as one.
    pub fn new(system_prompt: impl Into<String>, window: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            system_prompt: system_prompt.into(),
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Append a turn and return the trimmed context, system entry first.
    pub fn append_and_get_context(&self, sender: &str, role: Role, text: &str) -> Vec<Message> {
        self.with_appended(sender, role, text, |session| session.to_vec())
    }

    /// Append a turn without returning the context.
    pub fn append(&self, sender: &str, role: Role, text: &str) {
        self.with_appended(sender, role, text, |_| ());
    }

    /// Push and trim under the sender's shard lock, then run `f` on the
    /// trimmed session before the lock is released.
    fn with_appended<T>(
        &self,
        sender: &str,
        role: Role,
        text: &str,
        f: impl FnOnce(&[Message]) -> T,
    ) -> T {
        let mut session = self
            .sessions
            .entry(sender.to_string())
            .or_insert_with(|| vec![Message::system(self.system_prompt.clone())]);

        session.push(Message::new(role, text));

        let limit = self.window + 1;
        if session.len() > limit {
            let excess = session.len() - limit;
            session.drain(1..1 + excess);
        }

        f(session.as_slice())
    }

    /// Snapshot of a sender's history, if the session exists.
    pub fn history(&self, sender: &str) -> Option<Vec<Message>> {
        self.sessions.get(sender).map(|s| s.value().clone())
    }

    /// Number of known senders.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
