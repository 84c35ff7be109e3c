//! Core types for Iris: chat messages and channel addressing.
//!
//! A chat network delivers two kinds of conversation targets:
//! - **group channels**, whose identifier starts with [`CHANNEL_PREFIX`] (`#general`)
//! - **direct targets**, which are plain usernames (`bob`)
//!
//! Channel identifiers compare case-insensitively; [`channel_key`] produces the
//! normalized form used as a map key everywhere in the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Leading marker that distinguishes a group channel from a direct target.
pub const CHANNEL_PREFIX: char = '#';

// ─────────────────────────────────────────────
// Channel addressing
// ─────────────────────────────────────────────

/// Whether `target` names a group channel (as opposed to a direct message).
pub fn is_channel(target: &str) -> bool {
    target.starts_with(CHANNEL_PREFIX)
}

/// Normalized, case-insensitive key for a channel or direct target.
pub fn channel_key(target: &str) -> String {
    target.to_lowercase()
}

/// The two conversation scopes a message can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageScope {
    /// One-to-one message; the target is the recipient's username.
    Direct,
    /// Group message on a `#channel`.
    Channel,
}

// ─────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────

/// A chat message as seen by the gateway.
///
/// Immutable once created; history snapshots hand out clones.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Channel (`#general`) or direct target (`bob`) as delivered by the network.
    pub channel: String,
    /// Username of the author.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// When the gateway received the message.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(
        channel: impl Into<String>,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(channel, sender, text, Utc::now())
    }

    /// Create a message with an explicit timestamp.
    pub fn with_timestamp(
        channel: impl Into<String>,
        sender: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Message {
            channel: channel.into(),
            sender: sender.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// Direct or channel-scoped, based on the target prefix.
    pub fn scope(&self) -> MessageScope {
        if is_channel(&self.channel) {
            MessageScope::Channel
        } else {
            MessageScope::Direct
        }
    }

    /// Normalized key of the target channel.
    pub fn channel_key(&self) -> String {
        channel_key(&self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_channel() {
        assert!(is_channel("#general"));
        assert!(is_channel("#"));
        assert!(!is_channel("bob"));
        assert!(!is_channel(""));
        assert!(!is_channel("bob#1"));
    }

    #[test]
    fn test_channel_key_lowercases() {
        assert_eq!(channel_key("#General"), "#general");
        assert_eq!(channel_key("Bob"), "bob");
    }

    #[test]
    fn test_message_scope() {
        assert_eq!(Message::new("#rust", "alice", "hi").scope(), MessageScope::Channel);
        assert_eq!(Message::new("bob", "alice", "hi").scope(), MessageScope::Direct);
    }

    #[test]
    fn test_message_json_keys() {
        let msg = Message::new("#Rust", "alice", "hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["channel"], "#Rust");
        assert_eq!(json["sender"], "alice");
        assert_eq!(json["text"], "hello");
        assert!(json["timestamp"].is_string());
    }
}
