//! Gateway event handler: what happens when the chat network speaks.
//!
//! For every inbound message the handler performs two independent side
//! effects:
//! 1. channel messages are appended to the [`HistoryStore`]
//! 2. every active session is evaluated by the router, and each resulting
//!    notification is handed to the [`PushClient`] on its own spawned task
//!
//! Delivery is fire-and-forget: the handler returns as soon as the tasks are
//! spawned, and a failed delivery is only logged.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use iris_core::bus::types::{message_from_event, ChatEvent, MalformedEvent};
use iris_core::history::HistoryStore;
use iris_core::mention::MentionMatcher;
use iris_core::session::SessionRegistry;
use iris_core::types::{Message, MessageScope};
use iris_core::utils::truncate_string;

use crate::base::{ChatClient, PushClient};
use crate::router::{self, Notification};

/// Longest message preview written to logs.
const LOG_PREVIEW_CHARS: usize = 80;

/// What handling one message did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageOutcome {
    /// Whether the message went into channel history.
    pub recorded: bool,
    /// Number of push deliveries spawned.
    pub dispatched: usize,
}

// ─────────────────────────────────────────────
// GatewayEventHandler
// ─────────────────────────────────────────────

/// Orchestrates history recording and notification dispatch.
///
/// Shared via `Arc`; safe to call from any number of tasks.
pub struct GatewayEventHandler {
    history: Arc<HistoryStore>,
    sessions: Arc<dyn SessionRegistry>,
    push: Arc<dyn PushClient>,
    chat: Arc<dyn ChatClient>,
    mentions: MentionMatcher,
    /// Channels joined when the connection comes up.
    autojoin: Vec<String>,
}

impl GatewayEventHandler {
    /// Create a handler over the given store and collaborators.
    pub fn new(
        history: Arc<HistoryStore>,
        sessions: Arc<dyn SessionRegistry>,
        push: Arc<dyn PushClient>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            history,
            sessions,
            push,
            chat,
            mentions: MentionMatcher::new(),
            autojoin: Vec::new(),
        }
    }

    /// Channels to join on [`ChatEvent::Connected`].
    pub fn with_autojoin(mut self, channels: Vec<String>) -> Self {
        self.autojoin = channels;
        self
    }

    /// Handle any inbound event.
    ///
    /// Never fails: malformed events and collaborator errors are logged.
    pub async fn handle_event(&self, event: ChatEvent) {
        match event {
            ChatEvent::Connected => self.on_connected().await,
            ChatEvent::Message {
                channel,
                sender,
                text,
            } => {
                if let Err(e) = self.handle_message(&channel, &sender, &text) {
                    warn!(channel = %channel, sender = %sender, error = %e, "dropping malformed message event");
                }
            }
            ChatEvent::Invite { channel } => self.on_invite(&channel).await,
        }
    }

    /// Record and route one inbound message.
    ///
    /// Must be called from within a Tokio runtime: deliveries are spawned
    /// onto it.
    pub fn handle_message(
        &self,
        channel: &str,
        sender: &str,
        text: &str,
    ) -> Result<MessageOutcome, MalformedEvent> {
        let message = message_from_event(channel, sender, text)?;
        debug!(
            channel = %message.channel,
            sender = %message.sender,
            text = %truncate_string(&message.text, LOG_PREVIEW_CHARS),
            "inbound message"
        );

        // Recording never depends on routing.
        let recorded = message.scope() == MessageScope::Channel;
        self.history.record_message(message.clone());

        let notifications = router::route(&message, self.sessions.as_ref(), &self.mentions);
        let dispatched = notifications.len();
        for notification in notifications {
            self.dispatch(notification);
        }

        Ok(MessageOutcome {
            recorded,
            dispatched,
        })
    }

    /// Ask the network to join `channel` with the gateway's own user.
    pub async fn join_channel(&self, channel: &str) -> anyhow::Result<()> {
        info!(channel = %channel, nick = %self.chat.nick(), "joining channel");
        self.chat.join_channel(channel).await
    }

    /// Up to `limit` most recent messages of `channel` (0 = all), oldest first.
    pub fn get_channel_history(&self, channel: &str, limit: usize) -> Vec<Message> {
        self.history.get_history(channel, limit)
    }

    /// The shared history store.
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    async fn on_connected(&self) {
        info!(nick = %self.chat.nick(), "connected to chat network");
        for channel in &self.autojoin {
            if let Err(e) = self.join_channel(channel).await {
                error!(channel = %channel, error = %e, "autojoin failed");
            }
        }
    }

    async fn on_invite(&self, channel: &str) {
        if channel.trim().is_empty() {
            warn!("dropping invite without a channel");
            return;
        }
        info!(channel = %channel, "received invite");
        if let Err(e) = self.join_channel(channel).await {
            error!(channel = %channel, error = %e, "failed to join invited channel");
        }
    }

    /// Spawn one detached delivery task.
    fn dispatch(&self, notification: Notification) {
        let push = self.push.clone();
        tokio::spawn(async move {
            let data = notification.data.to_map();
            match push
                .send(&notification.token, &notification.title, &notification.body, &data)
                .await
            {
                Ok(()) => debug!(
                    recipient = %notification.recipient,
                    kind = notification.kind().as_str(),
                    client = push.name(),
                    "notification delivered"
                ),
                Err(e) => error!(
                    recipient = %notification.recipient,
                    kind = notification.kind().as_str(),
                    client = push.name(),
                    error = %e,
                    "failed to send notification"
                ),
            }
        });
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
