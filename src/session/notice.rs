//! Transient user-facing notices.

use std::time::Duration;

use tokio::time::Instant;

use crate::ChatError;

/// What kind of failure a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Bad local input.
    Validation,
    /// Join refused by the admission service.
    Admission,
    /// Broker failure during join.
    Transport,
}

/// A message shown to the user for a limited time.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Notice kind.
    pub kind: NoticeKind,
    /// Text to display.
    pub message: String,
    /// How long the notice stays visible.
    pub ttl: Duration,
    raised_at: Instant,
}

impl Notice {
    /// Create a notice raised now.
    pub fn new(kind: NoticeKind, message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            ttl,
            raised_at: Instant::now(),
        }
    }

    /// Build a notice for a user-facing error; `None` for other errors.
    pub fn from_error(err: &ChatError, ttl: Duration) -> Option<Self> {
        let (kind, message) = match err {
            ChatError::Validation(m) => (NoticeKind::Validation, m),
            ChatError::Admission(m) => (NoticeKind::Admission, m),
            ChatError::Transport(m) => (NoticeKind::Transport, m),
            _ => return None,
        };
        Some(Self::new(kind, message.clone(), ttl))
    }

    /// Whether the notice should no longer be shown.
    pub fn is_expired(&self) -> bool {
        self.raised_at.elapsed() >= self.ttl
    }
}
