//! Configuration schema.
//!
//! Hierarchy: `Config` → `GatewayConfig`, `HistoryConfig`, `[SessionConfig]`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::duration::parse_duration;
use crate::bus::queue::DEFAULT_EVENT_BUFFER;
use crate::history::DEFAULT_RETENTION;
use crate::session::UserSession;

/// Retention string written into fresh configs (7 days).
pub const DEFAULT_HISTORY_DURATION: &str = "168h";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.iris/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub history: HistoryConfig,
    /// Sessions registered at startup.
    pub sessions: Vec<SessionConfig>,
}

// ─────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────

/// The gateway's own presence on the chat network.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Nickname the gateway connects as.
    pub nick: String,
    /// Channels joined as soon as the connection is registered.
    pub autojoin: Vec<String>,
    /// Inbound event buffer size.
    pub event_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            nick: "iris".to_string(),
            autojoin: Vec::new(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

// ─────────────────────────────────────────────
// History
// ─────────────────────────────────────────────

/// Channel history settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryConfig {
    /// Retention window, e.g. `"168h"`, `"30m"`, `"7d"`.
    pub duration: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_HISTORY_DURATION.to_string(),
        }
    }
}

impl HistoryConfig {
    /// Parsed retention window.
    ///
    /// An unparseable value is logged and replaced by the 7-day default so a
    /// typo never prevents the gateway from starting.
    pub fn retention(&self) -> Duration {
        match parse_duration(&self.duration) {
            Ok(duration) => duration,
            Err(e) => {
                warn!(
                    value = %self.duration,
                    error = %e,
                    "invalid history duration, using default 7 days"
                );
                DEFAULT_RETENTION
            }
        }
    }

    /// Whether `duration` parses.
    pub fn is_valid(&self) -> bool {
        parse_duration(&self.duration).is_ok()
    }
}

// ─────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────

/// A statically configured user session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub username: String,
    pub channels: Vec<String>,
    /// Push token; empty means the user gets no notifications.
    pub push_token: String,
}

impl SessionConfig {
    /// Build the runtime session this entry describes.
    pub fn to_session(&self) -> UserSession {
        let mut session = UserSession::new(&self.username);
        for channel in &self.channels {
            session = session.with_channel(channel);
        }
        if !self.push_token.is_empty() {
            session = session.with_push_token(&self.push_token);
        }
        session
    }
}
