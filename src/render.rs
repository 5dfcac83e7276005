//! Render collaborator interface.
//!
//! The session engine never produces markup. After every state change it
//! hands the current messages or roster to a [`Renderer`]. Message content
//! is passed through unescaped; renderers must escape it for their output.

use crate::chat::Message;
use crate::session::{ConnectionState, Notice};

/// Consumer of chat state snapshots.
pub trait Renderer: Send {
    /// The message log changed.
    fn render_messages(&mut self, messages: &[Message], own_nickname: &str);

    /// The roster should be (re)displayed.
    fn render_users(&mut self, users: &[String], own_nickname: &str);

    /// A transient notice was raised.
    fn show_notice(&mut self, _notice: &Notice) {}

    /// The connection state changed.
    fn connection_changed(&mut self, _state: ConnectionState) {}
}

/// Renderer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_messages(&mut self, _messages: &[Message], _own_nickname: &str) {}

    fn render_users(&mut self, _users: &[String], _own_nickname: &str) {}
}
