//! Line-oriented console front end.
//!
//! Parses input lines into chat commands, renders the transcript as plain
//! text and drives a [`SessionManager`] from stdin.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::chat::{Message, ReactionKind};
use crate::render::Renderer;
use crate::session::{ConnectionState, Notice, SessionManager};
use crate::Result;

/// Result of parsing a console input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Regular chat message.
    Message(String),
    /// Parsed command.
    Command(ConsoleCommand),
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Join under a nickname.
    Join(String),
    /// Leave the chat.
    Leave,
    /// Set the local user's reaction on a message.
    React {
        /// Target message id.
        message_id: i64,
        /// Chosen reaction.
        reaction: ReactionKind,
    },
    /// Show the roster.
    Who,
    /// Show help message.
    Help,
    /// Exit the client.
    Quit,
    /// Known command with bad arguments; carries the usage line.
    Invalid(&'static str),
    /// Unknown command.
    Unknown(String),
}

impl ConsoleCommand {
    /// Get the command name.
    pub fn name(&self) -> &str {
        match self {
            ConsoleCommand::Join(_) => "join",
            ConsoleCommand::Leave => "leave",
            ConsoleCommand::React { .. } => "react",
            ConsoleCommand::Who => "who",
            ConsoleCommand::Help => "help",
            ConsoleCommand::Quit => "quit",
            ConsoleCommand::Invalid(_) => "invalid",
            ConsoleCommand::Unknown(cmd) => cmd,
        }
    }
}

const JOIN_USAGE: &str = "/join <nickname>";
const REACT_USAGE: &str = "/react <message id> <like|dislike|heart>";

/// Parse a console input line into a message or command.
pub fn parse_input(input: &str) -> ConsoleInput {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return ConsoleInput::Message(trimmed.to_string());
    }

    let without_slash = &trimmed[1..];
    let (cmd, args) = match without_slash.find(' ') {
        Some(pos) => (&without_slash[..pos], without_slash[pos + 1..].trim()),
        None => (without_slash, ""),
    };

    let command = match cmd.to_lowercase().as_str() {
        "join" | "j" | "nick" => {
            if args.is_empty() {
                ConsoleCommand::Invalid(JOIN_USAGE)
            } else {
                ConsoleCommand::Join(args.to_string())
            }
        }
        "leave" | "part" => ConsoleCommand::Leave,
        "react" | "r" => parse_react(args),
        "who" | "w" | "users" => ConsoleCommand::Who,
        "help" | "h" | "?" => ConsoleCommand::Help,
        "quit" | "q" | "exit" => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(cmd.to_string()),
    };

    ConsoleInput::Command(command)
}

fn parse_react(args: &str) -> ConsoleCommand {
    let mut parts = args.split_whitespace();
    let (Some(id), Some(kind), None) = (parts.next(), parts.next(), parts.next()) else {
        return ConsoleCommand::Invalid(REACT_USAGE);
    };
    match (id.parse::<i64>(), kind.parse::<ReactionKind>()) {
        (Ok(message_id), Ok(reaction)) => ConsoleCommand::React {
            message_id,
            reaction,
        },
        _ => ConsoleCommand::Invalid(REACT_USAGE),
    }
}

/// Console command information for help display.
pub struct CommandInfo {
    /// Command name.
    pub name: &'static str,
    /// Command aliases.
    pub aliases: &'static [&'static str],
    /// Command syntax.
    pub syntax: &'static str,
    /// Command description.
    pub description: &'static str,
}

/// Get all available command information.
pub fn get_command_help() -> Vec<CommandInfo> {
    vec![
        CommandInfo {
            name: "join",
            aliases: &["j", "nick"],
            syntax: JOIN_USAGE,
            description: "Join the chat under a nickname",
        },
        CommandInfo {
            name: "leave",
            aliases: &["part"],
            syntax: "/leave",
            description: "Leave the chat and clear the transcript",
        },
        CommandInfo {
            name: "react",
            aliases: &["r"],
            syntax: REACT_USAGE,
            description: "Set your reaction on a message",
        },
        CommandInfo {
            name: "who",
            aliases: &["w", "users"],
            syntax: "/who",
            description: "Show the user list",
        },
        CommandInfo {
            name: "help",
            aliases: &["h", "?"],
            syntax: "/help",
            description: "Show this help",
        },
        CommandInfo {
            name: "quit",
            aliases: &["q", "exit"],
            syntax: "/quit",
            description: "Exit the client",
        },
    ]
}

/// Format the help message for display.
pub fn format_help() -> String {
    let mut lines = Vec::new();
    lines.push("=== Commands ===".to_string());
    lines.push(String::new());

    for info in get_command_help() {
        lines.push(info.syntax.to_string());
        if !info.aliases.is_empty() {
            lines.push(format!("  aliases: /{}", info.aliases.join(", /")));
        }
        lines.push(format!("  {}", info.description));
        lines.push(String::new());
    }
    lines.push("Anything else is sent as a message.".to_string());

    lines.join("\n")
}

/// Make remote text safe to print on a terminal.
///
/// Control characters other than tab are replaced by their escaped form,
/// so peers cannot inject terminal escape sequences.
pub fn printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() && c != '\t' {
            out.extend(c.escape_debug());
        } else {
            out.push(c);
        }
    }
    out
}

/// Format one transcript line.
///
/// Messages that mention `own_nickname` are prefixed with `*`.
pub fn format_message(message: &Message, own_nickname: &str) -> String {
    let marker = if !own_nickname.is_empty() && message.mentions_user(own_nickname) {
        "*"
    } else {
        " "
    };
    let mut line = format!(
        "{marker}[{}] #{} <{}> {}",
        message.created_at.format("%H:%M:%S"),
        message.id,
        printable(&message.nickname),
        printable(&message.content)
    );

    let summary = message.reaction_summary();
    if !summary.is_empty() {
        let counts: Vec<String> = summary
            .iter()
            .map(|c| format!("{} {}", c.kind, c.count))
            .collect();
        line.push_str(&format!("  ({})", counts.join(" ")));
    }
    line
}

/// Format the roster for display.
pub fn format_who(users: &[String], own_nickname: &str) -> String {
    let mut lines = vec![format!("=== Users ({}) ===", users.len())];
    for name in users {
        let shown = printable(name);
        if name == own_nickname {
            lines.push(format!("  {shown} (you)"));
        } else {
            lines.push(format!("  {shown}"));
        }
    }
    lines.join("\n")
}

/// Renderer that prints plain text to a writer.
pub struct ConsoleRenderer<W> {
    out: W,
    printed: usize,
}

impl ConsoleRenderer<std::io::Stdout> {
    /// Renderer writing to stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleRenderer<W> {
    /// Create a renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out, printed: 0 }
    }

    /// Consume the renderer and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            debug!("console write failed: {e}");
        }
    }
}

impl<W: Write + Send> Renderer for ConsoleRenderer<W> {
    fn render_messages(&mut self, messages: &[Message], own_nickname: &str) {
        // Only appends are printed incrementally; anything else redraws.
        let start = if messages.len() == self.printed + 1 {
            self.printed
        } else {
            if !messages.is_empty() {
                self.emit("--- transcript ---");
            }
            0
        };
        for message in &messages[start..] {
            let line = format_message(message, own_nickname);
            self.emit(&line);
        }
        self.printed = messages.len();
    }

    fn render_users(&mut self, users: &[String], own_nickname: &str) {
        let text = format_who(users, own_nickname);
        self.emit(&text);
    }

    fn show_notice(&mut self, notice: &Notice) {
        let text = format!("!! {}", printable(&notice.message));
        self.emit(&text);
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        let text = format!("-- {state}");
        self.emit(&text);
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Run the console loop until `/quit` or end of input.
pub async fn run(session: &mut SessionManager) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", format_help());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let Flow::Quit = handle_line(session, &line).await {
                    break;
                }
            }
            dispatched = session.process_next() => {
                debug!(?dispatched, "inbound event");
            }
        }
    }

    session.leave();
    Ok(())
}

async fn handle_line(session: &mut SessionManager, line: &str) -> Flow {
    match parse_input(line) {
        ConsoleInput::Message(text) => {
            if text.is_empty() {
                return Flow::Continue;
            }
            match session.send_message(&text) {
                Ok(Some(_)) => {}
                Ok(None) => println!("Join first: {JOIN_USAGE}"),
                Err(e) => println!("Message not sent: {e}"),
            }
        }
        ConsoleInput::Command(command) => {
            debug!(command = command.name(), "console command");
            match command {
                ConsoleCommand::Join(nickname) => {
                    // Failures are reported through the renderer's notice.
                    let _ = session.join(&nickname).await;
                }
                ConsoleCommand::Leave => session.leave(),
                ConsoleCommand::React {
                    message_id,
                    reaction,
                } => match session.toggle_reaction(message_id, reaction) {
                    Ok(true) => {}
                    Ok(false) => println!("Join first: {JOIN_USAGE}"),
                    Err(e) => println!("Reaction not sent: {e}"),
                },
                ConsoleCommand::Who => session.render_users(),
                ConsoleCommand::Help => println!("{}", format_help()),
                ConsoleCommand::Quit => return Flow::Quit,
                ConsoleCommand::Invalid(usage) => println!("Usage: {usage}"),
                ConsoleCommand::Unknown(cmd) => println!("Unknown command: /{cmd} (try /help)"),
            }
        }
    }
    Flow::Continue
}
