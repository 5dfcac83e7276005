//! Chat message and reaction types.
//!
//! These are the shapes carried on the wire as JSON: [`Message`] on the
//! public topic and [`ReactionEvent`] on the reaction topic.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mention::parse_mentions;
use crate::ChatError;

/// Kind of reaction a user can attach to a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionKind {
    /// Thumbs up.
    Like,
    /// Thumbs down.
    Dislike,
    /// Heart.
    Heart,
}

impl ReactionKind {
    /// All kinds in display order.
    pub const ALL: [ReactionKind; 3] = [ReactionKind::Like, ReactionKind::Dislike, ReactionKind::Heart];

    /// Get the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "LIKE",
            ReactionKind::Dislike => "DISLIKE",
            ReactionKind::Heart => "HEART",
        }
    }
}

impl std::fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LIKE" => Ok(ReactionKind::Like),
            "DISLIKE" => Ok(ReactionKind::Dislike),
            "HEART" => Ok(ReactionKind::Heart),
            _ => Err(ChatError::Validation(format!("unknown reaction: {s}"))),
        }
    }
}

/// Number of users holding one reaction kind on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionCount {
    /// Reaction kind.
    pub kind: ReactionKind,
    /// Number of users.
    pub count: usize,
}

/// Reaction state of a message: which nicknames hold which kind.
///
/// Serialized as `{"LIKE": ["bob"], "HEART": ["carol"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reactions(BTreeMap<ReactionKind, BTreeSet<String>>);

impl Reactions {
    /// Create an empty reaction state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `kind` as the only reaction `nickname` holds.
    ///
    /// Choosing the same kind again keeps it; there is no untoggle.
    pub fn set_choice(&mut self, nickname: &str, kind: ReactionKind) {
        for users in self.0.values_mut() {
            users.remove(nickname);
        }
        self.0.retain(|_, users| !users.is_empty());
        self.0
            .entry(kind)
            .or_default()
            .insert(nickname.to_string());
    }

    /// Nicknames holding the given kind.
    pub fn users(&self, kind: ReactionKind) -> Vec<&str> {
        self.0
            .get(&kind)
            .map(|users| users.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of nicknames holding the given kind.
    pub fn count(&self, kind: ReactionKind) -> usize {
        self.0.get(&kind).map_or(0, BTreeSet::len)
    }

    /// All kinds currently held by `nickname`.
    pub fn kinds_of(&self, nickname: &str) -> Vec<ReactionKind> {
        self.0
            .iter()
            .filter(|(_, users)| users.contains(nickname))
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Per-kind counts in display order, skipping kinds nobody holds.
    pub fn summary(&self) -> Vec<ReactionCount> {
        ReactionKind::ALL
            .iter()
            .map(|&kind| ReactionCount {
                kind,
                count: self.count(kind),
            })
            .filter(|c| c.count > 0)
            .collect()
    }

    /// Whether no user has reacted.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Client-generated id, unique within a store.
    pub id: i64,
    /// Author nickname.
    pub nickname: String,
    /// Raw, unescaped content.
    pub content: String,
    /// Creation time as set by the sender.
    pub created_at: DateTime<Utc>,
    /// Reaction state.
    #[serde(default)]
    pub reactions: Reactions,
    /// Mentioned nicknames, computed by the sender.
    #[serde(default)]
    pub mentions: Vec<String>,
}

impl Message {
    /// Compose an outbound message, extracting mentions from the content.
    pub fn compose(id: i64, nickname: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let mentions = parse_mentions(&content);
        Self {
            id,
            nickname: nickname.into(),
            content,
            created_at: Utc::now(),
            reactions: Reactions::new(),
            mentions,
        }
    }

    /// Create a message without mention extraction (system notices).
    pub fn system(id: i64, nickname: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            content: content.into(),
            created_at: Utc::now(),
            reactions: Reactions::new(),
            mentions: Vec::new(),
        }
    }

    /// Per-kind reaction counts for display.
    pub fn reaction_summary(&self) -> Vec<ReactionCount> {
        self.reactions.summary()
    }

    /// Whether the message mentions `nickname` (case-sensitive).
    pub fn mentions_user(&self, nickname: &str) -> bool {
        self.mentions.iter().any(|m| m == nickname)
    }
}

/// A "set my reaction to X" event published on the reaction topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEvent {
    /// Target message id.
    pub message_id: i64,
    /// Chosen reaction.
    pub reaction: ReactionKind,
    /// Reacting user.
    pub nickname: String,
}

impl ReactionEvent {
    /// Create a new reaction event.
    pub fn new(message_id: i64, reaction: ReactionKind, nickname: impl Into<String>) -> Self {
        Self {
            message_id,
            reaction,
            nickname: nickname.into(),
        }
    }
}

/// Time-based message id source.
///
/// Ids are milliseconds since the Unix epoch, bumped past the previous id
/// when the clock has not moved, so ids from one generator strictly increase.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: i64,
}

impl MessageIdGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id from the wall clock.
    pub fn next_id(&mut self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_millis: i64) -> i64 {
        let id = now_millis.max(self.last + 1);
        self.last = id;
        id
    }
}
