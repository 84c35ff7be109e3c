//! Notification routing: who gets a push for an inbound message.
//!
//! Two rules, evaluated independently for every active session:
//! - **Direct message** (`bob` as target): notify the session whose username
//!   equals the target.
//! - **Channel message** (`#general` as target): notify members of the
//!   channel whose username is mentioned in the text. Members who are not
//!   mentioned get nothing; there is no broadcast-to-channel.
//!
//! In both cases the sender is never notified of their own message and a
//! session without a push token is skipped. Usernames compare
//! case-insensitively, like channel names.
//!
//! Usernames are expected to be unique among active sessions. If two sessions
//! share a name, a direct message notifies both.

use std::collections::HashMap;

use tracing::debug;

use iris_core::mention::MentionMatcher;
use iris_core::session::{SessionRegistry, SessionSnapshot};
use iris_core::types::{Message, MessageScope};

// ─────────────────────────────────────────────
// Decision types
// ─────────────────────────────────────────────

/// Why a notification was sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    DirectMessage,
    Mention,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::DirectMessage => "dm",
            NotificationKind::Mention => "mention",
        }
    }
}

/// Metadata delivered alongside a notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationData {
    pub sender: String,
    pub channel: String,
    pub kind: NotificationKind,
}

impl NotificationData {
    /// Flat string map for the push client, with the key names mobile
    /// clients read: `sender`, `channel_name`, `type`.
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            ("sender".to_string(), self.sender.clone()),
            ("channel_name".to_string(), self.channel.clone()),
            ("type".to_string(), self.kind.as_str().to_string()),
        ])
    }
}

/// A push notification ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Username being notified.
    pub recipient: String,
    /// Push token of the recipient's device.
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: NotificationData,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        self.data.kind
    }
}

/// Outcome of evaluating one message against one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingDecision {
    Skip,
    Notify(Notification),
}

// ─────────────────────────────────────────────
// Routing
// ─────────────────────────────────────────────

/// Decide whether `session` should be notified about `message`.
pub fn decide(
    message: &Message,
    session: &SessionSnapshot,
    mentions: &MentionMatcher,
) -> RoutingDecision {
    let Some(token) = session.push_token.as_deref().filter(|t| !t.is_empty()) else {
        return RoutingDecision::Skip;
    };
    if same_user(&session.username, &message.sender) {
        return RoutingDecision::Skip;
    }

    match message.scope() {
        MessageScope::Direct => {
            if !same_user(&message.channel, &session.username) {
                return RoutingDecision::Skip;
            }
            RoutingDecision::Notify(Notification {
                recipient: session.username.clone(),
                token: token.to_string(),
                title: format!("Direct message from {}", message.sender),
                body: message.text.clone(),
                data: NotificationData {
                    sender: message.sender.clone(),
                    channel: message.channel.clone(),
                    kind: NotificationKind::DirectMessage,
                },
            })
        }
        MessageScope::Channel => {
            if !session.in_channel(&message.channel)
                || !mentions.is_mentioned(&session.username, &message.text)
            {
                return RoutingDecision::Skip;
            }
            RoutingDecision::Notify(Notification {
                recipient: session.username.clone(),
                token: token.to_string(),
                title: format!("Mention in {}", message.channel),
                body: format!("{}: {}", message.sender, message.text),
                data: NotificationData {
                    sender: message.sender.clone(),
                    channel: message.channel.clone(),
                    kind: NotificationKind::Mention,
                },
            })
        }
    }
}

fn same_user(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Evaluate `message` against every active session.
///
/// Returns the notifications to send; sessions that should not be notified
/// are simply absent.
pub fn route(
    message: &Message,
    sessions: &dyn SessionRegistry,
    mentions: &MentionMatcher,
) -> Vec<Notification> {
    let mut notifications = Vec::new();
    sessions.for_each_active_session(&mut |session| {
        if let RoutingDecision::Notify(notification) = decide(message, session, mentions) {
            debug!(
                recipient = %notification.recipient,
                kind = notification.kind().as_str(),
                channel = %message.channel,
                "notification routed"
            );
            notifications.push(notification);
        }
    });
    notifications
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
