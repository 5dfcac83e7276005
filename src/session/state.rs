//! Session state value and its transitions.
//!
//! Transitions take the current state by reference and return the next one,
//! so the lifecycle can be exercised without a transport.

use crate::{ChatError, Result};

/// Connection lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not joined.
    #[default]
    Disconnected,
    /// Join in progress (admission or broker handshake).
    Connecting,
    /// Subscribed and able to publish.
    Connected,
}

impl ConnectionState {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Local identity and connection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    nickname: String,
    connection: ConnectionState,
}

impl SessionState {
    /// Fresh, disconnected state with no identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Local nickname; empty until admitted.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Current connection state.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Whether the session can publish.
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Start a join. Only allowed from `Disconnected`.
    pub fn begin_join(&self) -> Result<Self> {
        match self.connection {
            ConnectionState::Disconnected => Ok(Self {
                nickname: String::new(),
                connection: ConnectionState::Connecting,
            }),
            ConnectionState::Connecting => Err(ChatError::Validation(
                "a join is already in progress".to_string(),
            )),
            ConnectionState::Connected => Err(ChatError::Validation(
                "already joined; leave first".to_string(),
            )),
        }
    }

    /// Record the admitted nickname while still connecting.
    pub fn admitted(&self, nickname: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            connection: self.connection,
        }
    }

    /// Subscription acknowledged.
    pub fn connected(&self) -> Self {
        Self {
            nickname: self.nickname.clone(),
            connection: ConnectionState::Connected,
        }
    }

    /// Broker closed the connection; identity is kept until leave.
    pub fn closed(&self) -> Self {
        Self {
            nickname: self.nickname.clone(),
            connection: ConnectionState::Disconnected,
        }
    }
}
