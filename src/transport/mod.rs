//! Publish/subscribe transport abstraction.
//!
//! A [`Transport`] opens [`Connection`]s to a broker. Every inbound event of
//! a connection (deliveries, errors, close) is pushed onto one unbounded
//! channel supplied at connect time; the session drains that channel in
//! order. Delivery is at-least-once: receivers must tolerate duplicates.

mod codec;
mod memory;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::BrokerConfig;
use crate::Result;

pub use codec::{encode, Inbound};
pub use memory::{MemoryBroker, Published};

/// Delivery quality requested for a subscription or publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    /// Fire and forget.
    AtMostOnce,
    /// Redelivered until acknowledged; duplicates possible.
    AtLeastOnce,
    /// Exactly once.
    ExactlyOnce,
}

impl QoS {
    /// Numeric level as used by MQTT.
    pub fn level(&self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// Event raised by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A payload arrived on a subscribed topic.
    Delivery {
        /// Topic the payload was published on.
        topic: String,
        /// Raw payload bytes.
        payload: Vec<u8>,
    },
    /// The connection reported an error but stays open.
    Error(String),
    /// The connection was closed by the broker.
    Closed,
}

/// Sending half of a connection's event channel.
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// Receiving half of a connection's event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Factory for broker connections.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the broker at `url` as `client_id`.
    ///
    /// Inbound events for the new connection are sent to `events`.
    async fn connect(
        &self,
        url: &str,
        client_id: &str,
        events: EventSender,
    ) -> Result<Box<dyn Connection>>;
}

/// An open broker connection.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Subscribe to `topics`. Resolves once the broker acknowledged.
    async fn subscribe(&self, topics: &[String], qos: QoS) -> Result<()>;

    /// Publish a payload. Fire-and-forget: success only means it was handed
    /// to the broker.
    fn publish(&self, topic: &str, payload: Vec<u8>, qos: QoS) -> Result<()>;

    /// Close the connection.
    async fn disconnect(&self) -> Result<()>;

    /// Whether the connection is still open.
    fn is_connected(&self) -> bool;
}

/// The two well-known chat topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Topic carrying [`crate::chat::Message`] payloads.
    pub public: String,
    /// Topic carrying [`crate::chat::ReactionEvent`] payloads.
    pub reaction: String,
}

impl Topics {
    /// Create a topic pair.
    pub fn new(public: impl Into<String>, reaction: impl Into<String>) -> Self {
        Self {
            public: public.into(),
            reaction: reaction.into(),
        }
    }

    /// Both topics, for subscribing.
    pub fn all(&self) -> Vec<String> {
        vec![self.public.clone(), self.reaction.clone()]
    }
}

impl From<&BrokerConfig> for Topics {
    fn from(config: &BrokerConfig) -> Self {
        Self::new(&config.public_topic, &config.reaction_topic)
    }
}

impl Default for Topics {
    fn default() -> Self {
        Self::from(&BrokerConfig::default())
    }
}
