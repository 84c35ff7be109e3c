//! Bus event types: what the chat-protocol client hands to the gateway.

use crate::types::Message;

/// An event delivered by the chat network connection.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    /// The gateway's own connection finished registering with the network.
    Connected,
    /// A message on a `#channel` or addressed directly to a user.
    Message {
        /// `#channel` or recipient username.
        channel: String,
        /// Author username.
        sender: String,
        /// Message body.
        text: String,
    },
    /// The gateway user was invited to a channel.
    Invite {
        channel: String,
    },
}

impl ChatEvent {
    /// Convenience constructor for a message event.
    pub fn message(
        channel: impl Into<String>,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        ChatEvent::Message {
            channel: channel.into(),
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// Convenience constructor for an invite event.
    pub fn invite(channel: impl Into<String>) -> Self {
        ChatEvent::Invite {
            channel: channel.into(),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::Connected => "connected",
            ChatEvent::Message { .. } => "message",
            ChatEvent::Invite { .. } => "invite",
        }
    }
}

/// Why an inbound message event could not be turned into a [`Message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEvent {
    #[error("message event has no target channel")]
    MissingChannel,
    #[error("message event has no sender")]
    MissingSender,
}

/// Validate the fields of a message event and stamp it with the current time.
///
/// Empty text is allowed; an empty target or sender is not.
pub fn message_from_event(
    channel: &str,
    sender: &str,
    text: &str,
) -> Result<Message, MalformedEvent> {
    if channel.trim().is_empty() {
        return Err(MalformedEvent::MissingChannel);
    }
    if sender.trim().is_empty() {
        return Err(MalformedEvent::MissingSender);
    }
    Ok(Message::new(channel, sender, text))
}
