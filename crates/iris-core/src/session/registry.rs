//! Active user sessions, as seen by the notification path.
//!
//! The gateway never owns or mutates user sessions on the hot path; it only
//! needs to enumerate them and read a consistent view of each one. That
//! contract is [`SessionRegistry`]. [`InMemorySessionRegistry`] is the
//! implementation used by the CLI and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::types::channel_key;

// ─────────────────────────────────────────────
// UserSession / SessionSnapshot
// ─────────────────────────────────────────────

/// A logged-in user of the gateway.
#[derive(Clone, Debug, Default)]
pub struct UserSession {
    /// Chat username.
    pub username: String,
    /// Normalized keys of the channels this user has joined.
    pub channels: HashSet<String>,
    /// Push-delivery token; `None` when the device never registered.
    pub push_token: Option<String>,
}

impl UserSession {
    /// Create a session with no channels and no push token.
    pub fn new(username: impl Into<String>) -> Self {
        UserSession {
            username: username.into(),
            channels: HashSet::new(),
            push_token: None,
        }
    }

    /// Builder-style push token setter.
    pub fn with_push_token(mut self, token: impl Into<String>) -> Self {
        self.push_token = Some(token.into());
        self
    }

    /// Builder-style channel join.
    pub fn with_channel(mut self, channel: &str) -> Self {
        self.channels.insert(channel_key(channel));
        self
    }

    /// Point-in-time copy of the fields the router reads.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            username: self.username.clone(),
            channels: self.channels.clone(),
            push_token: self
                .push_token
                .clone()
                .filter(|token| !token.is_empty()),
        }
    }
}

/// Read-only view of a session taken under its lock.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub username: String,
    pub channels: HashSet<String>,
    /// Always non-empty when present.
    pub push_token: Option<String>,
}

impl SessionSnapshot {
    /// Whether the user joined `channel` (any casing).
    pub fn in_channel(&self, channel: &str) -> bool {
        self.channels.contains(&channel_key(channel))
    }
}

// ─────────────────────────────────────────────
// SessionRegistry
// ─────────────────────────────────────────────

/// Enumerable set of active sessions.
///
/// Implementations must be safe to call from many event workers at once and
/// must not hold a registry-wide lock while `visit` runs for one session.
pub trait SessionRegistry: Send + Sync {
    /// Call `visit` once per active session with a consistent snapshot.
    fn for_each_active_session(&self, visit: &mut dyn FnMut(&SessionSnapshot));
}

/// Registry backed by a map of individually locked sessions.
///
/// Keyed by lowercase username; re-registering a name replaces the session.
#[derive(Default)]
pub struct InMemorySessionRegistry {
    sessions: RwLock<HashMap<String, Arc<RwLock<UserSession>>>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a session.
    pub fn register(&self, session: UserSession) {
        let key = session.username.to_lowercase();
        info!(username = %session.username, "registered session");
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(key, Arc::new(RwLock::new(session)));
    }

    /// Remove a session by username. Returns whether it existed.
    pub fn remove(&self, username: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let removed = sessions.remove(&username.to_lowercase()).is_some();
        if removed {
            info!(username = %username, "removed session");
        }
        removed
    }

    /// Record that `username` joined `channel`. Returns `false` for unknown users.
    pub fn join_channel(&self, username: &str, channel: &str) -> bool {
        self.update(username, |session| {
            session.channels.insert(channel_key(channel));
        })
    }

    /// Record that `username` left `channel`. Returns `false` for unknown users.
    pub fn part_channel(&self, username: &str, channel: &str) -> bool {
        self.update(username, |session| {
            session.channels.remove(&channel_key(channel));
        })
    }

    /// Set or clear the push token of `username`.
    pub fn set_push_token(&self, username: &str, token: Option<String>) -> bool {
        self.update(username, |session| session.push_token = token)
    }

    /// Snapshot of one session.
    pub fn get(&self, username: &str) -> Option<SessionSnapshot> {
        let session = self.lookup(username)?;
        let session = session.read().unwrap_or_else(PoisonError::into_inner);
        Some(session.snapshot())
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, username: &str) -> Option<Arc<RwLock<UserSession>>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(&username.to_lowercase()).cloned()
    }

    fn update(&self, username: &str, apply: impl FnOnce(&mut UserSession)) -> bool {
        match self.lookup(username) {
            Some(session) => {
                let mut session = session.write().unwrap_or_else(PoisonError::into_inner);
                apply(&mut session);
                debug!(username = %session.username, "updated session");
                true
            }
            None => false,
        }
    }
}

impl SessionRegistry for InMemorySessionRegistry {
    fn for_each_active_session(&self, visit: &mut dyn FnMut(&SessionSnapshot)) {
        // Clone the handles so the map lock is released before any visit.
        let sessions: Vec<Arc<RwLock<UserSession>>> = {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            sessions.values().cloned().collect()
        };

        for session in sessions {
            let snapshot = {
                let session = session.read().unwrap_or_else(PoisonError::into_inner);
                session.snapshot()
            };
            visit(&snapshot);
        }
    }
}
