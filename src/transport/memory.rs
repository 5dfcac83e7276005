//! In-process broker.
//!
//! Fans each publish out to every connection subscribed to its topic, in
//! publish order, including the publisher itself. Used by the console
//! client's local mode and by tests, which can also make it redeliver
//! payloads or fail the next handshake step.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::{Connection, EventSender, QoS, Transport, TransportEvent};
use crate::error::{ChatError, Result};

/// A payload accepted by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Client id of the publisher.
    pub client_id: String,
    /// Topic.
    pub topic: String,
    /// Raw payload.
    pub payload: Vec<u8>,
    /// Requested delivery quality.
    pub qos: QoS,
}

struct Client {
    key: u64,
    client_id: String,
    topics: HashSet<String>,
    events: EventSender,
}

struct BrokerState {
    clients: Vec<Client>,
    next_key: u64,
    redelivery: usize,
    fail_next_connect: Option<String>,
    fail_next_subscribe: Option<String>,
    stall_next_subscribe: bool,
    fail_disconnect: bool,
    published: Vec<Published>,
}

impl Default for BrokerState {
    fn default() -> Self {
        Self {
            clients: Vec::new(),
            next_key: 0,
            redelivery: 1,
            fail_next_connect: None,
            fail_next_subscribe: None,
            stall_next_subscribe: false,
            fail_disconnect: false,
            published: Vec::new(),
        }
    }
}

impl BrokerState {
    fn deliver(&mut self, topic: &str, payload: &[u8]) -> usize {
        let mut delivered = 0;
        let copies = self.redelivery;
        // Clients whose receiver is gone are pruned.
        self.clients.retain(|client| {
            if !client.topics.contains(topic) {
                return !client.events.is_closed();
            }
            for _ in 0..copies {
                let event = TransportEvent::Delivery {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                };
                if client.events.send(event).is_err() {
                    return false;
                }
            }
            delivered += 1;
            true
        });
        delivered
    }
}

/// Cloneable handle to an in-process broker.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
    /// Create a new broker with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deliver every publish `copies` times (at least once).
    pub fn set_redelivery(&self, copies: usize) {
        self.lock().redelivery = copies.max(1);
    }

    /// Make the next `connect` fail with `reason`.
    pub fn fail_next_connect(&self, reason: impl Into<String>) {
        self.lock().fail_next_connect = Some(reason.into());
    }

    /// Make the next `subscribe` fail with `reason`.
    pub fn fail_next_subscribe(&self, reason: impl Into<String>) {
        self.lock().fail_next_subscribe = Some(reason.into());
    }

    /// Make the next `subscribe` never acknowledge.
    pub fn stall_next_subscribe(&self) {
        self.lock().stall_next_subscribe = true;
    }

    /// Make every `disconnect` report an error (the connection still closes).
    pub fn fail_disconnect(&self, fail: bool) {
        self.lock().fail_disconnect = fail;
    }

    /// Deliver a raw payload to subscribers of `topic` without recording it.
    ///
    /// Returns the number of connections it was delivered to.
    pub fn inject(&self, topic: &str, payload: impl AsRef<[u8]>) -> usize {
        self.lock().deliver(topic, payload.as_ref())
    }

    /// Report an error on every open connection.
    pub fn raise_error(&self, reason: &str) {
        for client in &self.lock().clients {
            let _ = client
                .events
                .send(TransportEvent::Error(reason.to_string()));
        }
    }

    /// Close every open connection from the broker side.
    pub fn close_all(&self) {
        let mut state = self.lock();
        for client in state.clients.drain(..) {
            let _ = client.events.send(TransportEvent::Closed);
        }
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.lock().clients.len()
    }

    /// Everything published so far, in order.
    pub fn published(&self) -> Vec<Published> {
        self.lock().published.clone()
    }

    /// Payloads published to `topic`, in order.
    pub fn published_to(&self, topic: &str) -> Vec<Published> {
        self.lock()
            .published
            .iter()
            .filter(|p| p.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MemoryBroker {
    async fn connect(
        &self,
        url: &str,
        client_id: &str,
        events: EventSender,
    ) -> Result<Box<dyn Connection>> {
        let mut state = self.lock();
        if let Some(reason) = state.fail_next_connect.take() {
            return Err(ChatError::Transport(format!("connect failed: {reason}")));
        }

        let key = state.next_key;
        state.next_key += 1;
        state.clients.push(Client {
            key,
            client_id: client_id.to_string(),
            topics: HashSet::new(),
            events,
        });
        debug!(url, client_id, "memory broker connection opened");

        Ok(Box::new(MemoryConnection {
            broker: self.clone(),
            key,
            client_id: client_id.to_string(),
        }))
    }
}

/// A connection to a [`MemoryBroker`].
pub struct MemoryConnection {
    broker: MemoryBroker,
    key: u64,
    client_id: String,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn subscribe(&self, topics: &[String], _qos: QoS) -> Result<()> {
        let stall = {
            let mut state = self.broker.lock();
            if let Some(reason) = state.fail_next_subscribe.take() {
                return Err(ChatError::Transport(format!("subscribe failed: {reason}")));
            }
            let stall = std::mem::take(&mut state.stall_next_subscribe);
            if !stall {
                let client = state
                    .clients
                    .iter_mut()
                    .find(|c| c.key == self.key)
                    .ok_or_else(|| ChatError::Transport("not connected".to_string()))?;
                client.topics.extend(topics.iter().cloned());
            }
            stall
        };

        if stall {
            // The ack never arrives.
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn publish(&self, topic: &str, payload: Vec<u8>, qos: QoS) -> Result<()> {
        let mut state = self.broker.lock();
        if !state.clients.iter().any(|c| c.key == self.key) {
            return Err(ChatError::Transport("not connected".to_string()));
        }
        state.deliver(topic, &payload);
        state.published.push(Published {
            client_id: self.client_id.clone(),
            topic: topic.to_string(),
            payload,
            qos,
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.broker.lock();
        state.clients.retain(|c| c.key != self.key);
        debug!(client_id = %self.client_id, "memory broker connection closed");
        if state.fail_disconnect {
            return Err(ChatError::Transport("close failed".to_string()));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.broker.lock().clients.iter().any(|c| c.key == self.key)
    }
}
