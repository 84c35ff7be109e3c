//! Inbound event bus: chat connection → gateway runtime.

pub mod queue;
pub mod types;

pub use queue::EventBus;
pub use types::{ChatEvent, MalformedEvent};
