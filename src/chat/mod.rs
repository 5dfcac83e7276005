//! Chat domain for MQTeam.
//!
//! This module provides the data side of a chat session:
//! - Messages, reactions and the wire shapes of both
//! - @-mention extraction
//! - The idempotent message log
//! - Reaction reconciliation
//! - The presence roster

mod mention;
mod message;
mod presence;
pub mod reaction;
mod store;

pub use mention::parse_mentions;
pub use message::{
    Message, MessageIdGenerator, ReactionCount, ReactionEvent, ReactionKind, Reactions,
};
pub use presence::{PresenceTracker, DEFAULT_ROSTER};
pub use reaction::ReactionOutcome;
pub use store::{MessageStore, SYSTEM_NICKNAME, WELCOME_MESSAGE, WELCOME_MESSAGE_ID};
