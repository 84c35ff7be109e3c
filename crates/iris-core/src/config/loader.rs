//! Config loader: reads `~/.iris/config.json`, merges env vars, and
//! applies legacy migrations.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.iris/config.json`
//! 3. Environment variables `IRIS_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    migrate_config(&mut raw);

    let config: Config = match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply legacy config migrations.
///
/// Older configs kept the retention as a flat top-level `historyDuration`;
/// it now lives at `history.duration`.
fn migrate_config(raw: &mut serde_json::Value) {
    let Some(root) = raw.as_object_mut() else {
        return;
    };
    let Some(legacy) = root.remove("historyDuration") else {
        return;
    };

    let history = root
        .entry("history")
        .or_insert_with(|| serde_json::json!({}));
    if let Some(history) = history.as_object_mut() {
        if !history.contains_key("duration") {
            history.insert("duration".to_string(), legacy);
            debug!("Migrated historyDuration → history.duration");
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `IRIS_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `IRIS_GATEWAY__NICK` → `gateway.nick`
/// - `IRIS_GATEWAY__EVENT_BUFFER` → `gateway.event_buffer`
/// - `IRIS_GATEWAY__AUTOJOIN` → `gateway.autojoin` (comma-separated)
/// - `IRIS_HISTORY__DURATION` → `history.duration`
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup` (the process environment in production).
fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(val) = lookup("IRIS_GATEWAY__NICK") {
        config.gateway.nick = val;
    }
    if let Some(val) = lookup("IRIS_GATEWAY__EVENT_BUFFER") {
        if let Ok(n) = val.parse::<usize>() {
            config.gateway.event_buffer = n;
        }
    }
    if let Some(val) = lookup("IRIS_GATEWAY__AUTOJOIN") {
        config.gateway.autojoin = val
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(val) = lookup("IRIS_HISTORY__DURATION") {
        config.history.duration = val;
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
