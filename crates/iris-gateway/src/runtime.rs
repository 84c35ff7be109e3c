//! Gateway runtime: drains the event bus into the event handler.
//!
//! Message events are handled inline on the loop task, so messages of one
//! channel reach history in the order the bus delivered them; their push
//! deliveries are spawned by the handler. Connected and invite events talk
//! to the network and get a task of their own.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use iris_core::bus::queue::EventBus;
use iris_core::bus::types::ChatEvent;

use crate::handler::GatewayEventHandler;

// ─────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────

/// Consumes [`ChatEvent`]s from the bus until shutdown is signalled.
pub struct Gateway {
    handler: Arc<GatewayEventHandler>,
    bus: Arc<EventBus>,
    /// Shutdown signal.
    shutdown: Arc<Notify>,
}

impl Gateway {
    /// Create a runtime over a handler and the bus the chat client publishes to.
    pub fn new(handler: Arc<GatewayEventHandler>, bus: Arc<EventBus>) -> Self {
        Self {
            handler,
            bus,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// The event handler, for direct queries such as history lookups.
    pub fn handler(&self) -> &Arc<GatewayEventHandler> {
        &self.handler
    }

    /// Run the event loop. Returns once [`Gateway::signal_shutdown`] is called
    /// or the bus closes.
    pub async fn run(&self) {
        info!("gateway runtime started");

        loop {
            tokio::select! {
                event = self.bus.consume() => {
                    match event {
                        Some(event) => self.dispatch(event),
                        None => {
                            info!("event bus closed, runtime exiting");
                            break;
                        }
                    }
                }
                _ = self.shutdown.notified() => {
                    info!("runtime received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Signal the runtime to stop. A signal sent before [`Gateway::run`]
    /// starts waiting is not lost.
    pub fn signal_shutdown(&self) {
        self.shutdown.notify_one();
    }

    fn dispatch(&self, event: ChatEvent) {
        debug!(kind = event.kind(), "consumed event");
        match event {
            ChatEvent::Message {
                channel,
                sender,
                text,
            } => {
                if let Err(e) = self.handler.handle_message(&channel, &sender, &text) {
                    warn!(channel = %channel, sender = %sender, error = %e, "dropping malformed message event");
                }
            }
            other => {
                let handler = self.handler.clone();
                tokio::spawn(async move {
                    handler.handle_event(other).await;
                });
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use iris_core::history::HistoryStore;
    use iris_core::session::{InMemorySessionRegistry, UserSession};
    use tokio::sync::{mpsc, Mutex};

    use crate::base::{ChatClient, PushClient};

    struct ChannelPush {
        tx: mpsc::UnboundedSender<(String, String)>,
    }

    #[async_trait]
    impl PushClient for ChannelPush {
        fn name(&self) -> &str {
            "channel"
        }

        async fn send(
            &self,
            token: &str,
            title: &str,
            _body: &str,
            _data: &HashMap<String, String>,
        ) -> anyhow::Result<()> {
            let _ = self.tx.send((token.to_string(), title.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockChat {
        joined: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatClient for MockChat {
        fn nick(&self) -> &str {
            "iris"
        }

        async fn join_channel(&self, channel: &str) -> anyhow::Result<()> {
            self.joined.lock().await.push(channel.to_string());
            Ok(())
        }
    }

    struct Fixture {
        gateway: Arc<Gateway>,
        bus: Arc<EventBus>,
        sessions: Arc<InMemorySessionRegistry>,
        chat: Arc<MockChat>,
        pushed: mpsc::UnboundedReceiver<(String, String)>,
    }

    fn fixture() -> Fixture {
        let (tx, pushed) = mpsc::unbounded_channel();
        let sessions = Arc::new(InMemorySessionRegistry::new());
        let chat = Arc::new(MockChat::default());
        let handler = GatewayEventHandler::new(
            Arc::new(HistoryStore::default()),
            sessions.clone(),
            Arc::new(ChannelPush { tx }),
            chat.clone(),
        )
        .with_autojoin(vec!["#general".into()]);
        let bus = Arc::new(EventBus::new(32));
        let gateway = Arc::new(Gateway::new(Arc::new(handler), bus.clone()));
        Fixture {
            gateway,
            bus,
            sessions,
            chat,
            pushed,
        }
    }

    async fn wait_until<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_shutdown_before_run_is_not_lost() {
        let f = fixture();
        f.gateway.signal_shutdown();
        tokio::time::timeout(Duration::from_secs(2), f.gateway.run())
            .await
            .expect("run should return after shutdown");
    }

    #[tokio::test]
    async fn test_messages_recorded_in_bus_order() {
        let f = fixture();
        let gw = f.gateway.clone();
        let handle = tokio::spawn(async move { gw.run().await });

        for i in 0..50 {
            f.bus
                .publish(ChatEvent::message("#general", "alice", format!("m{i}")))
                .await
                .unwrap();
        }

        let handler = f.gateway.handler().clone();
        wait_until(|| handler.get_channel_history("#general", 0).len() == 50).await;

        let texts: Vec<String> = handler
            .get_channel_history("#general", 0)
            .into_iter()
            .map(|m| m.text)
            .collect();
        let expected: Vec<String> = (0..50).map(|i| format!("m{i}")).collect();
        assert_eq!(texts, expected);

        f.gateway.signal_shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_runtime_routes_notifications() {
        let mut f = fixture();
        f.sessions.register(UserSession::new("bob").with_push_token("tok-bob"));

        let gw = f.gateway.clone();
        let handle = tokio::spawn(async move { gw.run().await });

        f.bus
            .publish(ChatEvent::message("bob", "alice", "hey"))
            .await
            .unwrap();

        let (token, title) = tokio::time::timeout(Duration::from_secs(2), f.pushed.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token, "tok-bob");
        assert_eq!(title, "Direct message from alice");

        f.gateway.signal_shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_connected_and_invite_events_join() {
        let f = fixture();
        let gw = f.gateway.clone();
        let handle = tokio::spawn(async move { gw.run().await });

        f.bus.publish(ChatEvent::Connected).await.unwrap();
        f.bus.publish(ChatEvent::invite("#secret")).await.unwrap();

        for _ in 0..200 {
            if f.chat.joined.lock().await.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let mut joined = f.chat.joined.lock().await.clone();
        joined.sort();
        assert_eq!(joined, vec!["#general".to_string(), "#secret".to_string()]);

        f.gateway.signal_shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_event_does_not_stop_runtime() {
        let f = fixture();
        let gw = f.gateway.clone();
        let handle = tokio::spawn(async move { gw.run().await });

        f.bus.publish(ChatEvent::message("", "alice", "lost")).await.unwrap();
        f.bus.publish(ChatEvent::message("#general", "", "lost")).await.unwrap();
        f.bus
            .publish(ChatEvent::message("#general", "alice", "kept"))
            .await
            .unwrap();

        let handler = f.gateway.handler().clone();
        wait_until(|| handler.get_channel_history("#general", 0).len() == 1).await;
        assert_eq!(handler.get_channel_history("#general", 0)[0].text, "kept");

        f.gateway.signal_shutdown();
        handle.await.unwrap();
    }
}
