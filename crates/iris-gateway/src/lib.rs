//! Iris Gateway: turns chat-network events into history and push notifications.
//!
//! This crate provides:
//! - **base**: the `ChatClient` and `PushClient` collaborator traits
//! - **router**: the per-session routing decision (direct message, mention, skip)
//! - **handler**: `GatewayEventHandler`, which records history and dispatches pushes
//! - **runtime**: `Gateway`, the loop that drains the event bus into the handler

pub mod base;
pub mod handler;
pub mod router;
pub mod runtime;

pub use base::{ChatClient, PushClient};
pub use handler::{GatewayEventHandler, MessageOutcome};
pub use router::{Notification, NotificationKind, RoutingDecision};
pub use runtime::Gateway;
