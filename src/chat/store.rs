//! In-memory message log.
//!
//! Messages are kept in arrival order, which may differ from `created_at`
//! order when the broker reorders deliveries. Appends are idempotent on the
//! message id so at-least-once redelivery never duplicates an entry.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::message::Message;
use crate::api::HistorySource;

/// Nickname used for the fallback welcome message.
pub const SYSTEM_NICKNAME: &str = "admin";

/// Id of the fallback welcome message.
pub const WELCOME_MESSAGE_ID: i64 = 1;

/// Content of the fallback welcome message.
pub const WELCOME_MESSAGE: &str = "Welcome to the MQTeam chat server.";

/// Append-only, id-deduplicated message log.
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    messages: Vec<Message>,
    ids: HashSet<i64>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a sequence of messages, dropping repeated ids.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let mut store = Self::new();
        for message in messages {
            store.append(message);
        }
        store
    }

    /// Build the startup store from the history snapshot.
    ///
    /// Any failure falls back to a single welcome message from
    /// [`SYSTEM_NICKNAME`]. This never fails.
    pub async fn bootstrap(history: &dyn HistorySource) -> Self {
        match history.fetch_history().await {
            Ok(messages) => {
                let store = Self::from_messages(messages);
                debug!(count = store.len(), "loaded message history");
                store
            }
            Err(e) => {
                warn!("history unavailable, using welcome message: {e}");
                Self::welcome()
            }
        }
    }

    /// Store holding only the welcome message.
    pub fn welcome() -> Self {
        Self::from_messages([Message::system(
            WELCOME_MESSAGE_ID,
            SYSTEM_NICKNAME,
            WELCOME_MESSAGE,
        )])
    }

    /// Append a message.
    ///
    /// Returns true if it was added, false if its id was already present.
    pub fn append(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// All messages in arrival order.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Find a message by id.
    pub fn find_by_id(&self, id: i64) -> Option<&Message> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.messages.iter().find(|m| m.id == id)
    }

    /// Find a message by id for in-place mutation.
    pub fn find_by_id_mut(&mut self, id: i64) -> Option<&mut Message> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Discard every message.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }
}
