//! Configuration module for MQTeam.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::{ChatError, Result};

/// HTTP API configuration (history snapshot and join admission).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the chat API, e.g. `http://localhost:3000/api`.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_api_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_api_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_api_connect_timeout() -> u64 {
    5
}

fn default_api_request_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            connect_timeout_secs: default_api_connect_timeout(),
            request_timeout_secs: default_api_request_timeout(),
        }
    }
}

/// Pub/sub broker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Broker URL.
    #[serde(default = "default_broker_url")]
    pub url: String,
    /// Topic carrying chat messages.
    #[serde(default = "default_public_topic")]
    pub public_topic: String,
    /// Topic carrying reaction events.
    #[serde(default = "default_reaction_topic")]
    pub reaction_topic: String,
}

/// URL scheme of the in-process broker.
pub const BROKER_SCHEME: &str = "memory";

fn default_broker_url() -> String {
    "memory://local".to_string()
}

fn default_public_topic() -> String {
    "k8s-chat/public".to_string()
}

fn default_reaction_topic() -> String {
    "k8s-chat/reaction".to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_broker_url(),
            public_topic: default_public_topic(),
            reaction_topic: default_reaction_topic(),
        }
    }
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Timeout for the admission call during join, in seconds.
    #[serde(default = "default_join_timeout")]
    pub join_timeout_secs: u64,
    /// Timeout for the broker connect + subscribe handshake, in seconds.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
    /// How long a user-facing notice stays visible, in seconds.
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
}

fn default_join_timeout() -> u64 {
    10
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_notice_secs() -> u64 {
    3
}

impl SessionConfig {
    /// Admission timeout as a duration.
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    /// Handshake timeout as a duration.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Notice lifetime as a duration.
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            join_timeout_secs: default_join_timeout(),
            handshake_timeout_secs: default_handshake_timeout(),
            notice_secs: default_notice_secs(),
        }
    }
}

/// Presence roster configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    /// Nicknames shown as active from startup.
    #[serde(default = "default_presence_seed")]
    pub seed: Vec<String>,
}

fn default_presence_seed() -> Vec<String> {
    vec!["admin".to_string(), "user".to_string()]
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            seed: default_presence_seed(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/mqteam.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP API configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Broker configuration.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Presence roster.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ChatError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ChatError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `MQTEAM_API_BASE`: Override the API base URL
    /// - `MQTEAM_BROKER_URL`: Override the broker URL
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var("MQTEAM_API_BASE") {
            if !base.is_empty() {
                self.api.base_url = base;
            }
        }
        if let Ok(broker) = std::env::var("MQTEAM_BROKER_URL") {
            if !broker.is_empty() {
                self.broker.url = broker;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The API base URL or broker URL does not parse
    /// - The broker URL scheme is not `memory` (the only available driver)
    /// - A topic is empty, or both topics are the same
    /// - A timeout is zero
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url)
            .map_err(|e| ChatError::Config(format!("invalid api.base_url: {e}")))?;
        let broker_url = Url::parse(&self.broker.url)
            .map_err(|e| ChatError::Config(format!("invalid broker.url: {e}")))?;
        if broker_url.scheme() != BROKER_SCHEME {
            return Err(ChatError::Config(format!(
                "unsupported broker.url scheme `{}`; only {BROKER_SCHEME}:// is available",
                broker_url.scheme()
            )));
        }

        if self.broker.public_topic.is_empty() || self.broker.reaction_topic.is_empty() {
            return Err(ChatError::Config("broker topics must not be empty".to_string()));
        }
        if self.broker.public_topic == self.broker.reaction_topic {
            return Err(ChatError::Config(
                "broker.public_topic and broker.reaction_topic must differ".to_string(),
            ));
        }
        if self.session.join_timeout_secs == 0 || self.session.handshake_timeout_secs == 0 {
            return Err(ChatError::Config(
                "session timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
