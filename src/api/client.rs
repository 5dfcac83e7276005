//! reqwest client for the chat HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{AdmissionService, HistorySource};
use crate::chat::Message;
use crate::config::ApiConfig;
use crate::error::{ChatError, Result};

/// User agent string for API calls.
const USER_AGENT: &str = concat!("mqteam/", env!("CARGO_PKG_VERSION"));

/// Response body of `GET /messages`.
#[derive(Debug, Deserialize)]
pub struct HistoryEnvelope {
    /// `"success"` when `data` is valid.
    pub status: String,
    /// Messages, present on success.
    #[serde(default)]
    pub data: Option<Vec<Message>>,
}

impl HistoryEnvelope {
    /// Unwrap the messages, rejecting any non-success envelope.
    pub fn into_messages(self) -> Result<Vec<Message>> {
        match (self.status.as_str(), self.data) {
            ("success", Some(data)) => Ok(data),
            (status, _) => Err(ChatError::MalformedPayload(format!(
                "history response status: {status}"
            ))),
        }
    }
}

#[derive(Serialize)]
struct JoinRequest<'a> {
    nickname: &'a str,
}

/// HTTP client for the history and admission endpoints.
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ChatError::Config(format!("invalid api.base_url: {e}")))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ChatError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl AdmissionService for ApiClient {
    async fn admit(&self, nickname: &str) -> Result<()> {
        let url = self.endpoint("join");
        debug!(%url, nickname, "requesting admission");

        let response = self
            .client
            .post(&url)
            .json(&JoinRequest { nickname })
            .send()
            .await
            .map_err(|e| ChatError::Admission(format!("admission service unreachable: {e}")))?;

        if !response.status().is_success() {
            debug!(status = %response.status(), nickname, "admission refused");
            return Err(ChatError::Admission(
                "nickname is already in use".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl HistorySource for ApiClient {
    async fn fetch_history(&self) -> Result<Vec<Message>> {
        let url = self.endpoint("messages");
        debug!(%url, "fetching message history");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Transport(format!("failed to fetch history: {e}")))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChatError::Transport(format!("failed to read history: {e}")))?;

        let envelope: HistoryEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| ChatError::MalformedPayload(format!("history body: {e}")))?;
        envelope.into_messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let body = r#"{"status":"success","data":[{"id":1,"nickname":"a","content":"x","created_at":"2024-01-01T00:00:00Z"}]}"#;
        let envelope: HistoryEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.into_messages().unwrap().len(), 1);
    }

    #[test]
    fn test_envelope_error_status() {
        let envelope: HistoryEnvelope =
            serde_json::from_str(r#"{"status":"error","message":"db down"}"#).unwrap();
        assert!(matches!(
            envelope.into_messages(),
            Err(ChatError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_envelope_success_without_data() {
        let envelope: HistoryEnvelope = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(envelope.into_messages().is_err());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ApiConfig {
            base_url: "http://localhost:3000/api/".to_string(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.endpoint("join"), "http://localhost:3000/api/join");
        assert_eq!(client.base_url().host_str(), Some("localhost"));
        assert_eq!(client.base_url().port(), Some(3000));
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let config = ApiConfig {
            base_url: "::nope::".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(ChatError::Config(_))));
    }
}
