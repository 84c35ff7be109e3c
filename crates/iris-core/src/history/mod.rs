//! Channel history: memory-resident, time-windowed message log per `#channel`.
//!
//! History lives for the lifetime of the process only. Entries older than the
//! retention window are pruned whenever a new message arrives on the same
//! channel.

pub mod store;

pub use store::{HistoryStore, DEFAULT_RETENTION};
