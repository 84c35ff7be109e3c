//! Time-windowed, per-channel message history.
//!
//! Locking: the channel map sits behind one `RwLock` that is only held long
//! enough to look up or insert a channel entry. Each channel then has its own
//! `RwLock`, so appends and reads on `#rust` never wait on `#general`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::types::{channel_key, is_channel, Message};

/// Default retention window: 7 days.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// ─────────────────────────────────────────────
// ChannelHistory
// ─────────────────────────────────────────────

/// Arrival-ordered messages of one channel.
#[derive(Debug, Default)]
struct ChannelHistory {
    messages: Vec<Message>,
}

impl ChannelHistory {
    /// Drop the prefix of messages at or before `cutoff`.
    ///
    /// Returns how many messages were removed.
    fn prune(&mut self, cutoff: DateTime<Utc>) -> usize {
        match self.messages.iter().position(|m| m.timestamp > cutoff) {
            Some(first_valid) => {
                self.messages.drain(..first_valid);
                first_valid
            }
            None => {
                let removed = self.messages.len();
                self.messages.clear();
                removed
            }
        }
    }

    /// Clone of the last `limit` messages (all of them when `limit` is 0).
    fn tail(&self, limit: usize) -> Vec<Message> {
        let len = self.messages.len();
        if limit == 0 || limit >= len {
            self.messages.clone()
        } else {
            self.messages[len - limit..].to_vec()
        }
    }
}

// ─────────────────────────────────────────────
// HistoryStore
// ─────────────────────────────────────────────

/// In-memory history of every group channel the gateway has seen.
///
/// Shared between event workers via `Arc<HistoryStore>`. Direct messages are
/// never stored.
pub struct HistoryStore {
    /// Maximum age of a retained message.
    retention: Duration,
    /// Normalized channel key → that channel's history.
    channels: RwLock<HashMap<String, Arc<RwLock<ChannelHistory>>>>,
}

impl HistoryStore {
    /// Create an empty store with the given retention window.
    pub fn new(retention: Duration) -> Self {
        HistoryStore {
            retention,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// The configured retention window.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Append a channel message and prune entries that fell out of the window.
    ///
    /// Messages addressed to a user rather than a `#channel` are ignored.
    pub fn record_message(&self, message: Message) {
        if !is_channel(&message.channel) {
            debug!(target_user = %message.channel, "direct message, not recorded");
            return;
        }

        let key = message.channel_key();
        let history = self.get_or_create(&key);
        let mut history = history.write().unwrap_or_else(PoisonError::into_inner);

        history.messages.push(message);
        let pruned = history.prune(self.cutoff());

        if pruned > 0 {
            info!(channel = %key, pruned, "pruned expired messages");
        }
        debug!(
            channel = %key,
            total = history.messages.len(),
            "appended message to history"
        );
    }

    /// Up to `limit` most recent messages of `channel`, oldest first.
    ///
    /// A `limit` of 0 returns everything retained. Unknown channels and
    /// channels whose messages all expired both yield an empty list.
    pub fn get_history(&self, channel: &str, limit: usize) -> Vec<Message> {
        let key = channel_key(channel);
        let history = {
            let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
            match channels.get(&key) {
                Some(history) => history.clone(),
                None => {
                    debug!(channel = %key, "no history for channel");
                    return Vec::new();
                }
            }
        };

        let history = history.read().unwrap_or_else(PoisonError::into_inner);
        let messages = history.tail(limit);
        debug!(channel = %key, returned = messages.len(), "read channel history");
        messages
    }

    /// Keys of every channel that has (or had) history, sorted.
    pub fn channel_keys(&self) -> Vec<String> {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = channels.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Look up a channel's history, inserting an empty one on first use.
    fn get_or_create(&self, key: &str) -> Arc<RwLock<ChannelHistory>> {
        {
            let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(history) = channels.get(key) {
                return history.clone();
            }
        }

        // Re-check under the write lock: another worker may have won the race.
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(key.to_string())
            .or_insert_with(|| {
                info!(channel = %key, "created channel history");
                Arc::new(RwLock::new(ChannelHistory::default()))
            })
            .clone()
    }

    /// Oldest timestamp that is still outside the window.
    fn cutoff(&self) -> DateTime<Utc> {
        let window = TimeDelta::from_std(self.retention).unwrap_or(TimeDelta::MAX);
        Utc::now()
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
