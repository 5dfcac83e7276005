//! Locally known roster of active users.
//!
//! The roster is seeded once and never changes: joins, leaves and broker
//! traffic do not touch it.

use std::collections::BTreeSet;

/// Default roster shown before any configuration is applied.
pub const DEFAULT_ROSTER: &[&str] = &["admin", "user"];

/// Static set of active nicknames.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    users: BTreeSet<String>,
}

impl PresenceTracker {
    /// Create a tracker seeded with the given nicknames.
    pub fn seeded<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: seed.into_iter().map(Into::into).collect(),
        }
    }

    /// Active nicknames, sorted.
    pub fn users(&self) -> Vec<String> {
        self.users.iter().cloned().collect()
    }

    /// Number of active nicknames.
    pub fn count(&self) -> usize {
        self.users.len()
    }

    /// Whether `nickname` is on the roster.
    pub fn contains(&self, nickname: &str) -> bool {
        self.users.contains(nickname)
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::seeded(DEFAULT_ROSTER.iter().copied())
    }
}
