//! Interactive console: stands in for a real chat network connection.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Plain lines are injected as inbound messages; lines starting with `/`
//! are console commands.
//!
//! Runs on a blocking thread: events are handed to the bus with
//! `blocking_send`, and async work is driven through the runtime handle.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Local;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use iris_core::bus::types::ChatEvent;
use iris_core::session::{
    InMemorySessionRegistry, SessionRegistry, SessionSnapshot, UserSession,
};
use iris_core::types::{is_channel, Message};
use iris_gateway::GatewayEventHandler;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Messages shown by `/history` when no limit is given.
const DEFAULT_HISTORY_LIMIT: usize = 20;

const HELP: &str = "\
  <sender> <target> <text>   inject a message (#channel or username target)
  /join <#channel>           join a channel as the gateway user
  /invite <#channel>         simulate an invite to a channel
  /history <#channel> [n]    show the last n messages (0 = all)
  /sessions                  list sessions
  /login <user> [token]      register a session
  /logout <user>             remove a session
  /enter <user> <#channel>   add a channel to a session
  /part <user> <#channel>    remove a channel from a session
  /token <user> [token]      set or clear a session's push token
  /help                      show this help
  exit                       quit";

/// One parsed console line.
#[derive(Debug, PartialEq)]
pub enum ConsoleInput {
    Event(ChatEvent),
    Join(String),
    History { channel: String, limit: usize },
    Sessions,
    Session(SessionCommand),
    Help,
    Exit,
}

/// A change to the session registry made from the console.
#[derive(Debug, PartialEq)]
pub enum SessionCommand {
    Login { username: String, token: Option<String> },
    Logout { username: String },
    Enter { username: String, channel: String },
    Part { username: String, channel: String },
    Token { username: String, token: Option<String> },
}

/// Parse a non-empty, trimmed console line.
pub fn parse_line(line: &str) -> Result<ConsoleInput> {
    if is_exit_command(line) {
        return Ok(ConsoleInput::Exit);
    }

    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        bail!("empty input");
    };

    if let Some(command) = head.strip_prefix('/') {
        return match command.to_lowercase().as_str() {
            "join" => Ok(ConsoleInput::Join(channel_arg(parts.next(), "/join")?)),
            "invite" => Ok(ConsoleInput::Event(ChatEvent::invite(channel_arg(
                parts.next(),
                "/invite",
            )?))),
            "history" => {
                let channel = channel_arg(parts.next(), "/history")?;
                let limit = match parts.next() {
                    Some(n) => n
                        .parse::<usize>()
                        .map_err(|_| anyhow::anyhow!("limit must be a non-negative number, got {n:?}"))?,
                    None => DEFAULT_HISTORY_LIMIT,
                };
                Ok(ConsoleInput::History { channel, limit })
            }
            "sessions" => Ok(ConsoleInput::Sessions),
            "login" => {
                let username = user_arg(parts.next(), "/login <user> [token]")?;
                let token = parts.next().map(String::from);
                Ok(ConsoleInput::Session(SessionCommand::Login { username, token }))
            }
            "logout" => {
                let username = user_arg(parts.next(), "/logout <user>")?;
                Ok(ConsoleInput::Session(SessionCommand::Logout { username }))
            }
            "enter" => {
                let username = user_arg(parts.next(), "/enter <user> <#channel>")?;
                let channel = channel_arg(parts.next(), "/enter")?;
                Ok(ConsoleInput::Session(SessionCommand::Enter { username, channel }))
            }
            "part" => {
                let username = user_arg(parts.next(), "/part <user> <#channel>")?;
                let channel = channel_arg(parts.next(), "/part")?;
                Ok(ConsoleInput::Session(SessionCommand::Part { username, channel }))
            }
            "token" => {
                let username = user_arg(parts.next(), "/token <user> [token]")?;
                let token = parts.next().map(String::from);
                Ok(ConsoleInput::Session(SessionCommand::Token { username, token }))
            }
            "help" => Ok(ConsoleInput::Help),
            other => bail!("unknown command /{other} (try /help)"),
        };
    }

    // `<sender> <target> <text…>`; the text keeps its inner spacing.
    let sender = head;
    let rest = line[sender.len()..].trim_start();
    let Some(target) = rest.split_whitespace().next() else {
        bail!("usage: <sender> <target> <text>");
    };
    let text = rest[target.len()..].trim_start();
    Ok(ConsoleInput::Event(ChatEvent::message(target, sender, text)))
}

fn channel_arg(arg: Option<&str>, command: &str) -> Result<String> {
    match arg {
        Some(channel) if is_channel(channel) => Ok(channel.to_string()),
        Some(other) => bail!("{command}: {other:?} is not a #channel"),
        None => bail!("usage: {command} <#channel>"),
    }
}

fn user_arg(arg: Option<&str>, usage: &str) -> Result<String> {
    match arg {
        Some(user) if !is_channel(user) => Ok(user.to_string()),
        Some(other) => bail!("{other:?} is a channel, not a user; usage: {usage}"),
        None => bail!("usage: {usage}"),
    }
}

/// Apply a session change and describe the result.
pub fn apply_session_command(
    registry: &InMemorySessionRegistry,
    command: SessionCommand,
) -> Result<String> {
    match command {
        SessionCommand::Login { username, token } => {
            let mut session = UserSession::new(&username);
            if let Some(token) = token {
                session = session.with_push_token(token);
            }
            registry.register(session);
            Ok(format!("{username} logged in"))
        }
        SessionCommand::Logout { username } => {
            if !registry.remove(&username) {
                bail!("no session for {username}");
            }
            Ok(format!("{username} logged out"))
        }
        SessionCommand::Enter { username, channel } => {
            if !registry.join_channel(&username, &channel) {
                bail!("no session for {username}");
            }
            Ok(format!("{username} entered {channel}"))
        }
        SessionCommand::Part { username, channel } => {
            if !registry.part_channel(&username, &channel) {
                bail!("no session for {username}");
            }
            Ok(format!("{username} left {channel}"))
        }
        SessionCommand::Token { username, token } => {
            let cleared = token.is_none();
            if !registry.set_push_token(&username, token) {
                bail!("no session for {username}");
            }
            if cleared {
                Ok(format!("push disabled for {username}"))
            } else {
                Ok(format!("push enabled for {username}"))
            }
        }
    }
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

/// One history line: `[14:03:07] <alice> hello`.
pub fn format_message(message: &Message) -> String {
    format!(
        "[{}] <{}> {}",
        message.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        message.sender,
        message.text
    )
}

/// One `/sessions` line.
pub fn format_session(session: &SessionSnapshot) -> String {
    let mut channels: Vec<&str> = session.channels.iter().map(String::as_str).collect();
    channels.sort_unstable();
    let push = if session.push_token.is_some() {
        "push on"
    } else {
        "push off"
    };
    format!("{:<16} {:<8} {}", session.username, push, channels.join(" "))
}

// ─────────────────────────────────────────────
// Loop
// ─────────────────────────────────────────────

/// Everything the console needs from the running gateway.
pub struct ConsoleContext {
    pub handler: Arc<GatewayEventHandler>,
    pub sessions: Arc<InMemorySessionRegistry>,
    pub events: mpsc::Sender<ChatEvent>,
    pub runtime: Handle,
}

/// Run the console loop until exit, Ctrl-C, or Ctrl-D. Blocking.
pub fn run(ctx: ConsoleContext) -> Result<()> {
    crate::helpers::print_banner();

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("iris> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&input);

        let parsed = match parse_line(trimmed) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("  {} {e}", "✗".red());
                continue;
            }
        };

        debug!(input = trimmed, "console input");
        match parsed {
            ConsoleInput::Exit => {
                println!("\nGoodbye!");
                break;
            }
            ConsoleInput::Event(event) => {
                if ctx.events.blocking_send(event).is_err() {
                    eprintln!("  {} gateway is no longer running", "✗".red());
                    break;
                }
            }
            ConsoleInput::Join(channel) => {
                if let Err(e) = ctx.runtime.block_on(ctx.handler.join_channel(&channel)) {
                    eprintln!("  {} join {channel}: {e}", "✗".red());
                }
            }
            ConsoleInput::History { channel, limit } => {
                let messages = ctx.handler.get_channel_history(&channel, limit);
                if messages.is_empty() {
                    println!("  {}", format!("(no history for {channel})").dimmed());
                }
                for message in &messages {
                    println!("  {}", format_message(message));
                }
            }
            ConsoleInput::Sessions => {
                let mut lines = Vec::new();
                ctx.sessions
                    .for_each_active_session(&mut |session| lines.push(format_session(session)));
                if lines.is_empty() {
                    println!(
                        "  {}",
                        "(no sessions; add some in the config or with /login)".dimmed()
                    );
                }
                lines.sort();
                for line in lines {
                    println!("  {line}");
                }
            }
            ConsoleInput::Session(command) => {
                match apply_session_command(&ctx.sessions, command) {
                    Ok(done) => println!("  {} {done}", "✓".green()),
                    Err(e) => eprintln!("  {} {e}", "✗".red()),
                }
            }
            ConsoleInput::Help => println!("{HELP}"),
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded console history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save console history: {e}");
    }
}

/// Path to the console history file.
fn history_path() -> std::path::PathBuf {
    iris_core::utils::get_data_path()
        .join("history")
        .join("console_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
