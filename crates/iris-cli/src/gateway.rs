//! Gateway command: wires config, history, sessions, and the console clients.
//!
//! Startup sequence:
//! 1. Load config
//! 2. Build the history store from the configured retention window
//! 3. Seed the session registry from `sessions`
//! 4. Create the event bus, handler, and runtime
//! 5. Publish `Connected` so autojoin channels are joined
//! 6. Run the runtime next to the console until exit or Ctrl+C

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use iris_core::bus::queue::EventBus;
use iris_core::bus::types::ChatEvent;
use iris_core::config::{get_config_path, load_config, Config};
use iris_core::history::HistoryStore;
use iris_core::session::InMemorySessionRegistry;
use iris_core::types::channel_key;
use iris_gateway::{ChatClient, Gateway, GatewayEventHandler, PushClient};

use crate::console::{self, ConsoleContext};
use crate::helpers;

// ─────────────────────────────────────────────
// Console clients
// ─────────────────────────────────────────────

/// Chat client for the console: joins are printed and remembered.
pub struct ConsoleChat {
    nick: String,
    joined: Mutex<BTreeSet<String>>,
}

impl ConsoleChat {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            joined: Mutex::new(BTreeSet::new()),
        }
    }

    /// Channels joined so far, sorted.
    pub fn joined(&self) -> Vec<String> {
        self.joined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChatClient for ConsoleChat {
    fn nick(&self) -> &str {
        &self.nick
    }

    async fn join_channel(&self, channel: &str) -> Result<()> {
        let newly_joined = self
            .joined
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel_key(channel));
        if newly_joined {
            println!("  {} {} joined {}", "→".green(), self.nick, channel.bold());
        } else {
            println!("  {} already in {}", "·".dimmed(), channel);
        }
        Ok(())
    }
}

/// Push client for the console: every notification is printed.
pub struct ConsolePush;

#[async_trait]
impl PushClient for ConsolePush {
    fn name(&self) -> &str {
        "console"
    }

    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<()> {
        let kind = data.get("type").map(String::as_str).unwrap_or("?");
        println!(
            "  {} [{}] {} {}: {}",
            "🔔".yellow(),
            kind.dimmed(),
            format!("push:{token}").dimmed(),
            title.bold(),
            body
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────

/// Seed a registry from the configured sessions, skipping nameless entries.
pub fn seed_sessions(config: &Config) -> InMemorySessionRegistry {
    let registry = InMemorySessionRegistry::new();
    for entry in &config.sessions {
        if entry.username.trim().is_empty() {
            warn!("skipping configured session without a username");
            continue;
        }
        registry.register(entry.to_session());
    }
    registry
}

/// Run the gateway until the console exits or Ctrl+C.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    // 1. Load config
    let config = load_config(config_path);

    // 2. History store
    let retention = config.history.retention();
    let history = Arc::new(HistoryStore::new(retention));

    // 3. Sessions
    let sessions = Arc::new(seed_sessions(&config));

    // 4. Handler + bus + runtime
    let chat = Arc::new(ConsoleChat::new(config.gateway.nick.clone()));
    let handler = Arc::new(
        GatewayEventHandler::new(history, sessions.clone(), Arc::new(ConsolePush), chat.clone())
            .with_autojoin(config.gateway.autojoin.clone()),
    );
    let bus = Arc::new(EventBus::new(config.gateway.event_buffer));
    let gateway = Arc::new(Gateway::new(handler.clone(), bus.clone()));

    info!(
        nick = %config.gateway.nick,
        retention_secs = retention.as_secs(),
        sessions = sessions.len(),
        "gateway starting"
    );

    println!();
    println!(
        "  Config:    {}",
        config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(get_config_path)
            .display()
    );
    println!("  Nick:      {}", config.gateway.nick);
    println!("  Retention: {}", helpers::format_duration(retention));
    println!("  Sessions:  {} seeded", sessions.len());

    let runtime_task = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.run().await })
    };

    // 5. The console connection is up as soon as the runtime is.
    bus.publish(ChatEvent::Connected)
        .await
        .context("failed to publish connected event")?;

    // 6. Console on its own thread; it exits with the process on Ctrl+C.
    let ctx = ConsoleContext {
        handler,
        sessions,
        events: bus.sender(),
        runtime: Handle::current(),
    };
    let (done_tx, done_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("iris-console".into())
        .spawn(move || {
            let _ = done_tx.send(console::run(ctx));
        })
        .context("failed to start console thread")?;

    tokio::select! {
        result = done_rx => {
            match result {
                Ok(Ok(())) => info!("console closed"),
                Ok(Err(e)) => error!(error = %e, "console error"),
                Err(_) => error!("console thread exited unexpectedly"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("  Shutting down...");
            info!("received Ctrl+C, shutting down");
        }
    }

    gateway.signal_shutdown();
    if let Err(e) = runtime_task.await {
        error!(error = %e, "gateway runtime task failed");
    }

    let joined = chat.joined();
    if !joined.is_empty() {
        info!(channels = ?joined, "left channels");
    }
    println!("  Gateway stopped. Goodbye!");
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use iris_core::config::SessionConfig;
    use iris_core::session::SessionRegistry;

    #[tokio::test]
    async fn console_chat_remembers_joins() {
        let chat = ConsoleChat::new("iris");
        chat.join_channel("#Rust").await.unwrap();
        chat.join_channel("#rust").await.unwrap();
        chat.join_channel("#general").await.unwrap();

        assert_eq!(chat.nick(), "iris");
        assert_eq!(chat.joined(), vec!["#general", "#rust"]);
    }

    #[tokio::test]
    async fn console_push_always_succeeds() {
        let data = HashMap::from([("type".to_string(), "dm".to_string())]);
        ConsolePush
            .send("tok", "Direct message from alice", "hi", &data)
            .await
            .unwrap();
        assert_eq!(ConsolePush.name(), "console");
    }

    #[test]
    fn seed_sessions_from_config() {
        let mut config = Config::default();
        config.sessions = vec![
            SessionConfig {
                username: "bob".into(),
                channels: vec!["#General".into()],
                push_token: "tok-bob".into(),
            },
            SessionConfig {
                username: "  ".into(),
                ..Default::default()
            },
            SessionConfig {
                username: "carol".into(),
                ..Default::default()
            },
        ];

        let registry = seed_sessions(&config);
        assert_eq!(registry.len(), 2);

        let bob = registry.get("bob").unwrap();
        assert!(bob.in_channel("#general"));
        assert_eq!(bob.push_token.as_deref(), Some("tok-bob"));
        assert_eq!(registry.get("carol").unwrap().push_token, None);

        let mut visited = 0;
        registry.for_each_active_session(&mut |_| visited += 1);
        assert_eq!(visited, 2);
    }
}
