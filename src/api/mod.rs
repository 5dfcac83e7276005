//! HTTP collaborators for MQTeam.
//!
//! The session engine only depends on the two traits here; [`ApiClient`]
//! is the reqwest-backed implementation of both.

mod client;

use async_trait::async_trait;

use crate::chat::Message;
use crate::Result;

pub use client::{ApiClient, HistoryEnvelope};

/// Join admission check.
#[async_trait]
pub trait AdmissionService: Send + Sync {
    /// Ask whether `nickname` may join.
    ///
    /// Fails with [`crate::ChatError::Admission`] when the nickname is
    /// refused or the service cannot be reached.
    async fn admit(&self, nickname: &str) -> Result<()>;
}

/// Source of the historical message snapshot.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch previously sent messages.
    async fn fetch_history(&self) -> Result<Vec<Message>>;
}
