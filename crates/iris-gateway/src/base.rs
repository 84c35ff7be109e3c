//! Collaborator traits: the chat connection and the push-delivery service.
//!
//! The gateway core never speaks a wire protocol itself. It is handed:
//! - a [`ChatClient`] to act on the chat network (joining channels)
//! - a [`PushClient`] to deliver notifications to user devices

use std::collections::HashMap;

use async_trait::async_trait;

/// The gateway's own connection to the chat network.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Nickname the gateway is connected as.
    fn nick(&self) -> &str;

    /// Ask the network to join `channel` with the gateway's own user.
    async fn join_channel(&self, channel: &str) -> anyhow::Result<()>;
}

/// Push-notification delivery.
///
/// Called from a detached task per notification; implementations own any
/// retry policy. An `Err` is logged by the caller and otherwise ignored.
#[async_trait]
pub trait PushClient: Send + Sync {
    /// Short name for logs (e.g. "fcm", "console").
    fn name(&self) -> &str;

    /// Deliver one notification to the device identified by `token`.
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> anyhow::Result<()>;
}
