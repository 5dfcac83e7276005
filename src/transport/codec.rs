//! JSON payload codec and inbound validation.

use serde::Serialize;

use super::Topics;
use crate::chat::{Message, ReactionEvent};
use crate::error::{ChatError, Result};

/// A validated inbound chat event.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A chat message from the public topic.
    Message(Message),
    /// A reaction event from the reaction topic.
    Reaction(ReactionEvent),
}

impl Inbound {
    /// Decode a raw delivery according to the topic it arrived on.
    ///
    /// Anything that is not a well-formed message or reaction event for
    /// its topic is rejected with [`ChatError::MalformedPayload`].
    pub fn decode(topics: &Topics, topic: &str, payload: &[u8]) -> Result<Self> {
        if topic == topics.public {
            let message: Message = serde_json::from_slice(payload)
                .map_err(|e| ChatError::MalformedPayload(format!("message: {e}")))?;
            if message.nickname.trim().is_empty() {
                return Err(ChatError::MalformedPayload(
                    "message without nickname".to_string(),
                ));
            }
            Ok(Inbound::Message(message))
        } else if topic == topics.reaction {
            let event: ReactionEvent = serde_json::from_slice(payload)
                .map_err(|e| ChatError::MalformedPayload(format!("reaction: {e}")))?;
            if event.nickname.trim().is_empty() {
                return Err(ChatError::MalformedPayload(
                    "reaction without nickname".to_string(),
                ));
            }
            Ok(Inbound::Reaction(event))
        } else {
            Err(ChatError::MalformedPayload(format!(
                "unexpected topic: {topic}"
            )))
        }
    }
}

/// Encode an outbound payload as JSON.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ChatError::Transport(format!("encode failed: {e}")))
}
