//! Async event bus between the chat connection and the gateway runtime.
//!
//! Uses a bounded `tokio::sync::mpsc` channel: the chat client (possibly
//! several producer tasks) publishes, the gateway runtime consumes.

use super::types::ChatEvent;
use tokio::sync::mpsc;

/// Default number of events buffered before publishers wait.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// The inbound event bus.
pub struct EventBus {
    tx: mpsc::Sender<ChatEvent>,
    rx: tokio::sync::Mutex<mpsc::Receiver<ChatEvent>>,
}

impl EventBus {
    /// Create a new bus with the given buffer capacity (at least 1).
    pub fn new(buffer_size: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        EventBus {
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Publish an event from the chat connection.
    pub async fn publish(&self, event: ChatEvent) -> Result<(), mpsc::error::SendError<ChatEvent>> {
        self.tx.send(event).await
    }

    /// Consume the next event (waits until one is available).
    ///
    /// Never returns `None` while the bus itself is alive, since it keeps a
    /// sender of its own; shutdown is signalled separately.
    pub async fn consume(&self) -> Option<ChatEvent> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// A cloned sender for producers that outlive a borrow of the bus.
    pub fn sender(&self) -> mpsc::Sender<ChatEvent> {
        self.tx.clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
