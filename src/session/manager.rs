//! Chat session manager.
//!
//! The manager is the only component that talks to the broker. User actions
//! (join, send, react, leave) enter through its methods; inbound broker
//! events are drained from a single channel by [`SessionManager::process_next`]
//! and routed to the message store or the reaction reconciler.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::notice::Notice;
use super::state::{ConnectionState, SessionState};
use super::validation::validate_nickname;
use crate::api::{AdmissionService, HistorySource};
use crate::chat::{
    reaction, Message, MessageIdGenerator, MessageStore, PresenceTracker, ReactionEvent,
    ReactionKind, ReactionOutcome,
};
use crate::config::{Config, SessionConfig};
use crate::render::Renderer;
use crate::transport::{
    encode, Connection, EventReceiver, EventSender, Inbound, QoS, Topics, Transport,
    TransportEvent,
};
use crate::{ChatError, Result};

/// Delivery quality used for every subscription and publish.
const CHAT_QOS: QoS = QoS::AtLeastOnce;

/// What happened to one inbound transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A new message was appended.
    MessageAppended(i64),
    /// A message id already in the store was delivered again.
    DuplicateMessage(i64),
    /// A different message reused an id already in the store; it was dropped.
    ConflictingMessage(i64),
    /// A reaction was applied to the message with this id.
    ReactionApplied(i64),
    /// A reaction targeted a message that is not stored.
    ReactionIgnored(i64),
    /// The payload failed validation and was dropped.
    Dropped(String),
    /// The connection reported an error.
    TransportError(String),
    /// The broker closed the connection.
    Closed,
}

/// Owns the session state, the message log and the broker connection.
pub struct SessionManager {
    config: SessionConfig,
    broker_url: String,
    topics: Topics,
    transport: Arc<dyn Transport>,
    admission: Arc<dyn AdmissionService>,
    history: Arc<dyn HistorySource>,
    renderer: Box<dyn Renderer>,
    state: SessionState,
    store: MessageStore,
    presence: PresenceTracker,
    ids: MessageIdGenerator,
    connection: Option<Box<dyn Connection>>,
    events: Option<EventReceiver>,
    notice: Option<Notice>,
}

impl SessionManager {
    /// Create a disconnected session manager.
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        admission: Arc<dyn AdmissionService>,
        history: Arc<dyn HistorySource>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            config: config.session.clone(),
            broker_url: config.broker.url.clone(),
            topics: Topics::from(&config.broker),
            transport,
            admission,
            history,
            renderer,
            state: SessionState::new(),
            store: MessageStore::new(),
            presence: PresenceTracker::seeded(config.presence.seed.iter().cloned()),
            ids: MessageIdGenerator::new(),
            connection: None,
            events: None,
            notice: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state.connection()
    }

    /// Local nickname; empty when not joined.
    pub fn nickname(&self) -> &str {
        self.state.nickname()
    }

    /// The message log.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        self.store.all()
    }

    /// The static roster.
    pub fn active_users(&self) -> Vec<String> {
        self.presence.users()
    }

    /// The latest notice, while it has not expired.
    pub fn current_notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| !n.is_expired())
    }

    /// Load the history snapshot into the store.
    ///
    /// Falls back to a welcome message when history is unavailable.
    pub async fn bootstrap(&mut self) {
        self.store = MessageStore::bootstrap(self.history.as_ref()).await;
        self.render_messages();
    }

    /// Join the chat under `nickname`.
    ///
    /// Validates the nickname, asks the admission service, then connects
    /// and subscribes to both chat topics. The session is `Connected` only
    /// after the subscription is acknowledged; on any failure it returns to
    /// `Disconnected` and a notice is raised.
    pub async fn join(&mut self, nickname: &str) -> Result<()> {
        let nickname = nickname.trim();
        match self.try_join(nickname).await {
            Ok(()) => {
                info!(nickname, "joined chat");
                self.notice = None;
                self.renderer.connection_changed(ConnectionState::Connected);
                self.render_messages();
                self.render_users();
                Ok(())
            }
            Err(e) => {
                warn!(nickname, "join failed: {e}");
                self.raise_notice(&e);
                Err(e)
            }
        }
    }

    async fn try_join(&mut self, nickname: &str) -> Result<()> {
        validate_nickname(nickname)?;
        self.state = self.state.begin_join()?;
        self.renderer.connection_changed(ConnectionState::Connecting);

        let admission = timeout(self.config.join_timeout(), self.admission.admit(nickname));
        let admitted = match admission.await {
            Ok(result) => result,
            Err(_) => Err(ChatError::Admission(
                "admission check timed out".to_string(),
            )),
        };
        if let Err(e) = admitted {
            self.abort_join();
            return Err(e);
        }
        self.state = self.state.admitted(nickname);

        let client_id = format!("mqteam-{}", Uuid::new_v4());
        let (tx, rx) = mpsc::unbounded_channel();
        match self.open_connection(&client_id, tx).await {
            Ok(connection) => {
                debug!(%client_id, "subscribed to chat topics");
                self.connection = Some(connection);
                self.events = Some(rx);
                self.state = self.state.connected();
                Ok(())
            }
            Err(e) => {
                self.abort_join();
                Err(e)
            }
        }
    }

    /// Connect and subscribe within the handshake timeout. A connection
    /// whose subscription fails or times out is closed again.
    async fn open_connection(
        &self,
        client_id: &str,
        events: EventSender,
    ) -> Result<Box<dyn Connection>> {
        let deadline = Instant::now() + self.config.handshake_timeout();
        let connection = timeout_at(
            deadline,
            self.transport.connect(&self.broker_url, client_id, events),
        )
        .await
        .map_err(|_| handshake_timed_out())??;

        let subscribed = match timeout_at(
            deadline,
            connection.subscribe(&self.topics.all(), CHAT_QOS),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(handshake_timed_out()),
        };

        if let Err(e) = subscribed {
            if let Err(close_err) = connection.disconnect().await {
                debug!("closing half-open connection failed: {close_err}");
            }
            return Err(e);
        }
        Ok(connection)
    }

    fn abort_join(&mut self) {
        self.state = SessionState::new();
        self.renderer
            .connection_changed(ConnectionState::Disconnected);
    }

    /// Leave the chat.
    ///
    /// Identity and messages are reset immediately. The connection is
    /// closed in the background and any close error is only logged.
    pub fn leave(&mut self) {
        let connection = self.connection.take();
        self.events = None;
        self.state = SessionState::new();
        self.store.clear();
        self.notice = None;
        info!("left chat");

        self.renderer
            .connection_changed(ConnectionState::Disconnected);
        self.render_messages();

        if let Some(connection) = connection.filter(|c| c.is_connected()) {
            match Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = connection.disconnect().await {
                            warn!("error while closing connection: {e}");
                        }
                    });
                }
                Err(_) => debug!("no runtime available, dropping connection unclosed"),
            }
        }
    }

    /// Publish a chat message.
    ///
    /// Does nothing unless connected and `content` is not blank. The local
    /// store is not updated; the message arrives back through the
    /// subscription. Returns the id of the published message.
    pub fn send_message(&mut self, content: &str) -> Result<Option<i64>> {
        let content = content.trim();
        if content.is_empty() || !self.state.is_connected() {
            return Ok(None);
        }

        let message = Message::compose(self.ids.next_id(), self.state.nickname(), content);
        self.publish(&self.topics.public, &message)?;
        debug!(id = message.id, mentions = ?message.mentions, "message published");
        Ok(Some(message.id))
    }

    /// Publish a reaction on a message as the local user.
    ///
    /// Does nothing unless connected. The local store is not updated.
    /// Returns whether an event was published.
    pub fn toggle_reaction(&mut self, message_id: i64, reaction: ReactionKind) -> Result<bool> {
        if !self.state.is_connected() {
            return Ok(false);
        }

        let event = ReactionEvent::new(message_id, reaction, self.state.nickname());
        self.publish(&self.topics.reaction, &event)?;
        debug!(message_id, %reaction, "reaction published");
        Ok(true)
    }

    fn publish<T: Serialize>(&self, topic: &str, value: &T) -> Result<()> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| ChatError::Transport("not connected".to_string()))?;
        let payload = encode(value)?;
        connection
            .publish(topic, payload, CHAT_QOS)
            .inspect_err(|e| warn!(topic, "publish dropped: {e}"))
    }

    /// Wait for the next inbound event and apply it.
    ///
    /// Never resolves while there is no connection. Cancel-safe, so it can
    /// be used as a `tokio::select!` branch.
    pub async fn process_next(&mut self) -> Dispatched {
        let event = match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => return std::future::pending().await,
        };
        self.handle_event(event.unwrap_or(TransportEvent::Closed))
    }

    /// Apply every inbound event already queued, without waiting.
    pub fn drain_pending(&mut self) -> Vec<Dispatched> {
        let mut dispatched = Vec::new();
        while let Some(rx) = self.events.as_mut() {
            match rx.try_recv() {
                Ok(event) => dispatched.push(self.handle_event(event)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    dispatched.push(self.handle_event(TransportEvent::Closed));
                    break;
                }
            }
        }
        dispatched
    }

    /// Apply one inbound event.
    pub fn handle_event(&mut self, event: TransportEvent) -> Dispatched {
        match event {
            TransportEvent::Delivery { topic, payload } => {
                match Inbound::decode(&self.topics, &topic, &payload) {
                    Ok(Inbound::Message(message)) => self.on_message(message),
                    Ok(Inbound::Reaction(event)) => self.on_reaction(&event),
                    Err(e) => {
                        warn!(topic, "dropping inbound payload: {e}");
                        Dispatched::Dropped(e.to_string())
                    }
                }
            }
            TransportEvent::Error(reason) => {
                warn!("transport error: {reason}");
                Dispatched::TransportError(reason)
            }
            TransportEvent::Closed => {
                warn!("connection closed by broker");
                self.connection = None;
                self.events = None;
                self.state = self.state.closed();
                self.renderer
                    .connection_changed(ConnectionState::Disconnected);
                Dispatched::Closed
            }
        }
    }

    fn on_message(&mut self, message: Message) -> Dispatched {
        let id = message.id;
        if let Some(existing) = self.store.find_by_id(id) {
            if existing.nickname != message.nickname || existing.content != message.content {
                warn!(
                    id,
                    kept = %existing.nickname,
                    dropped = %message.nickname,
                    "message id collision, dropping the later message"
                );
                return Dispatched::ConflictingMessage(id);
            }
            debug!(id, "duplicate message ignored");
            return Dispatched::DuplicateMessage(id);
        }
        self.store.append(message);
        self.render_messages();
        Dispatched::MessageAppended(id)
    }

    fn on_reaction(&mut self, event: &ReactionEvent) -> Dispatched {
        match reaction::apply(&mut self.store, event) {
            ReactionOutcome::Applied => {
                self.render_messages();
                Dispatched::ReactionApplied(event.message_id)
            }
            ReactionOutcome::UnknownMessage => {
                debug!(message_id = event.message_id, "reaction for unknown message ignored");
                Dispatched::ReactionIgnored(event.message_id)
            }
        }
    }

    fn raise_notice(&mut self, err: &ChatError) {
        if let Some(notice) = Notice::from_error(err, self.notice_ttl()) {
            self.renderer.show_notice(&notice);
            self.notice = Some(notice);
        }
    }

    fn notice_ttl(&self) -> Duration {
        self.config.notice_ttl()
    }

    fn render_messages(&mut self) {
        self.renderer
            .render_messages(self.store.all(), self.state.nickname());
    }

    /// Hand the roster to the renderer.
    pub fn render_users(&mut self) {
        let users = self.presence.users();
        self.renderer.render_users(&users, self.state.nickname());
    }
}

fn handshake_timed_out() -> ChatError {
    ChatError::Transport("broker handshake timed out".to_string())
}
