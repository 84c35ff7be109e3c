//! Iris Core: the message-relay core of the Iris chat gateway.
//!
//! This crate provides:
//! - **types**: `Message` and channel addressing helpers
//! - **history**: `HistoryStore`, the time-windowed per-channel history
//! - **mention**: whole-word, case-insensitive mention detection
//! - **session**: the `SessionRegistry` contract and an in-memory registry
//! - **bus**: inbound `ChatEvent`s and the `EventBus` that carries them
//! - **config**: schema, loader, and duration parsing

pub mod bus;
pub mod config;
pub mod history;
pub mod mention;
pub mod session;
pub mod types;
pub mod utils;

pub use history::HistoryStore;
pub use mention::MentionMatcher;
pub use types::Message;
