//! MQTeam - real-time group chat over publish/subscribe
//!
//! A chat session engine: nickname admission, a broker connection on two
//! topics, an idempotent message log with @-mentions, and single-choice
//! reactions reconciled from broker events.

pub mod api;
pub mod chat;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod render;
pub mod session;
pub mod transport;

pub use api::{AdmissionService, ApiClient, HistorySource};
pub use chat::{
    parse_mentions, Message, MessageStore, PresenceTracker, ReactionEvent, ReactionKind,
};
pub use config::Config;
pub use error::{ChatError, Result};
pub use render::{NullRenderer, Renderer};
pub use session::{ConnectionState, Dispatched, SessionManager, SessionState};
pub use transport::{Connection, MemoryBroker, QoS, Topics, Transport, TransportEvent};
