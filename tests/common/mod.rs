//! Test helpers for session tests.
//!
//! Provides fake HTTP collaborators, a recording renderer, and a helper
//! that serves an axum router on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use mqteam::chat::Message;
use mqteam::config::{ApiConfig, Config};
use mqteam::session::{ConnectionState, Notice};
use mqteam::{
    AdmissionService, ChatError, HistorySource, MemoryBroker, Renderer, Result, SessionManager,
};

/// Admission service that accepts everyone except the listed nicknames.
#[derive(Default)]
pub struct FakeAdmission {
    taken: Vec<String>,
    calls: AtomicUsize,
}

impl FakeAdmission {
    /// Refuse the given nicknames.
    pub fn refusing(taken: &[&str]) -> Self {
        Self {
            taken: taken.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of admission requests seen.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdmissionService for FakeAdmission {
    async fn admit(&self, nickname: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.taken.iter().any(|t| t == nickname) {
            return Err(ChatError::Admission("nickname is already in use".into()));
        }
        Ok(())
    }
}

/// Admission service that never answers.
pub struct HangingAdmission;

#[async_trait]
impl AdmissionService for HangingAdmission {
    async fn admit(&self, _nickname: &str) -> Result<()> {
        std::future::pending().await
    }
}

/// History source returning a fixed result.
pub enum FakeHistory {
    Messages(Vec<Message>),
    Unavailable,
}

#[async_trait]
impl HistorySource for FakeHistory {
    async fn fetch_history(&self) -> Result<Vec<Message>> {
        match self {
            FakeHistory::Messages(messages) => Ok(messages.clone()),
            FakeHistory::Unavailable => Err(ChatError::Transport("connection refused".into())),
        }
    }
}

/// What a [`RecordingRenderer`] has seen.
#[derive(Debug, Default)]
pub struct Rendered {
    pub message_renders: usize,
    pub last_messages: Vec<Message>,
    pub last_users: Vec<String>,
    pub notices: Vec<String>,
    pub states: Vec<ConnectionState>,
}

/// Renderer that records every call into shared state.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub seen: Arc<Mutex<Rendered>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for RecordingRenderer {
    fn render_messages(&mut self, messages: &[Message], _own_nickname: &str) {
        let mut seen = self.seen.lock().unwrap();
        seen.message_renders += 1;
        seen.last_messages = messages.to_vec();
    }

    fn render_users(&mut self, users: &[String], _own_nickname: &str) {
        self.seen.lock().unwrap().last_users = users.to_vec();
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.seen.lock().unwrap().notices.push(notice.message.clone());
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        self.seen.lock().unwrap().states.push(state);
    }
}

/// Build a session on `broker` with the given collaborators.
pub fn session_with(
    broker: &MemoryBroker,
    admission: Arc<dyn AdmissionService>,
    history: Arc<dyn HistorySource>,
    renderer: RecordingRenderer,
) -> SessionManager {
    SessionManager::new(
        &Config::default(),
        Arc::new(broker.clone()),
        admission,
        history,
        Box::new(renderer),
    )
}

/// Build a session that admits everyone and has no history.
pub fn session(broker: &MemoryBroker) -> SessionManager {
    session_with(
        broker,
        Arc::new(FakeAdmission::default()),
        Arc::new(FakeHistory::Unavailable),
        RecordingRenderer::new(),
    )
}

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

/// API configuration pointing at a local test server.
pub fn api_config(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        base_url: format!("http://{addr}/api"),
        ..ApiConfig::default()
    }
}
