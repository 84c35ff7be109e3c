//! User sessions: who is logged in, which channels they joined, and where to
//! push their notifications.

pub mod registry;

pub use registry::{InMemorySessionRegistry, SessionRegistry, SessionSnapshot, UserSession};
