//! Configuration system: schema, loading, env var overrides, durations.
//!
//! # Usage
//! ```no_run
//! use iris_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Retention: {:?}", cfg.history.retention());
//! ```

pub mod duration;
pub mod loader;
pub mod schema;

pub use duration::{parse_duration, DurationError};
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{Config, GatewayConfig, HistoryConfig, SessionConfig};
