//! End-to-end: events published on the bus come out as history and pushes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use iris_core::bus::queue::EventBus;
use iris_core::bus::types::ChatEvent;
use iris_core::history::HistoryStore;
use iris_core::session::{InMemorySessionRegistry, UserSession};
use iris_gateway::{ChatClient, Gateway, GatewayEventHandler, PushClient};

#[derive(Debug)]
struct Push {
    token: String,
    title: String,
    body: String,
    data: HashMap<String, String>,
}

struct CollectingPush(mpsc::UnboundedSender<Push>);

#[async_trait]
impl PushClient for CollectingPush {
    fn name(&self) -> &str {
        "collecting"
    }

    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> anyhow::Result<()> {
        let _ = self.0.send(Push {
            token: token.into(),
            title: title.into(),
            body: body.into(),
            data: data.clone(),
        });
        Ok(())
    }
}

#[derive(Default)]
struct RecordingChat(Mutex<Vec<String>>);

#[async_trait]
impl ChatClient for RecordingChat {
    fn nick(&self) -> &str {
        "iris"
    }

    async fn join_channel(&self, channel: &str) -> anyhow::Result<()> {
        self.0.lock().await.push(channel.to_string());
        Ok(())
    }
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Push>) -> Push {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for push")
        .expect("push channel closed")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn relay_end_to_end() {
    let (tx, mut pushes) = mpsc::unbounded_channel();

    let sessions = Arc::new(InMemorySessionRegistry::new());
    sessions.register(
        UserSession::new("Bob")
            .with_channel("#general")
            .with_push_token("tok-bob"),
    );
    sessions.register(UserSession::new("carol").with_channel("#general"));
    sessions.register(
        UserSession::new("dave")
            .with_channel("#random")
            .with_push_token("tok-dave"),
    );

    let chat = Arc::new(RecordingChat::default());
    let handler = GatewayEventHandler::new(
        Arc::new(HistoryStore::new(Duration::from_secs(3600))),
        sessions.clone(),
        Arc::new(CollectingPush(tx)),
        chat.clone(),
    )
    .with_autojoin(vec!["#general".into()]);
    let bus = Arc::new(EventBus::new(16));
    let gateway = Arc::new(Gateway::new(Arc::new(handler), bus.clone()));

    let runner = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.run().await })
    };

    bus.publish(ChatEvent::Connected).await.unwrap();
    // Mentions Bob (different case); carol has no token, dave is elsewhere.
    bus.publish(ChatEvent::message("#general", "alice", "hey bob, carol, dave"))
        .await
        .unwrap();
    // Self-mention produces nothing.
    bus.publish(ChatEvent::message("#general", "bob", "bob here"))
        .await
        .unwrap();
    // Direct message to dave, never recorded.
    bus.publish(ChatEvent::message("dave", "alice", "lunch?"))
        .await
        .unwrap();

    let first = recv(&mut pushes).await;
    let second = recv(&mut pushes).await;
    let mut by_token: HashMap<String, Push> = HashMap::new();
    by_token.insert(first.token.clone(), first);
    by_token.insert(second.token.clone(), second);

    let mention = &by_token["tok-bob"];
    assert_eq!(mention.title, "Mention in #general");
    assert_eq!(mention.body, "alice: hey bob, carol, dave");
    assert_eq!(mention.data["type"], "mention");
    assert_eq!(mention.data["channel_name"], "#general");

    let dm = &by_token["tok-dave"];
    assert_eq!(dm.title, "Direct message from alice");
    assert_eq!(dm.body, "lunch?");
    assert_eq!(dm.data["type"], "dm");
    assert_eq!(dm.data["sender"], "alice");

    // Nothing else is delivered.
    assert!(
        tokio::time::timeout(Duration::from_millis(200), pushes.recv())
            .await
            .is_err()
    );

    let history = gateway.handler().get_channel_history("#GENERAL", 0);
    let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["hey bob, carol, dave", "bob here"]);
    assert!(gateway.handler().get_channel_history("dave", 0).is_empty());
    assert_eq!(gateway.handler().get_channel_history("#general", 1)[0].text, "bob here");

    assert_eq!(*chat.0.lock().await, vec!["#general".to_string()]);

    gateway.signal_shutdown();
    runner.await.unwrap();
}
