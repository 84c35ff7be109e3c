//! `iris onboard`: initialize configuration.
//!
//! - Creates `~/.iris/config.json` with defaults (never overwrites)
//! - Creates the console history directory

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use iris_core::config::{get_config_path, save_config, Config};
use iris_core::utils::get_data_path;

/// Run the onboard command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "✦ Iris Setup".cyan().bold());
    println!();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    if ensure_config(&path)? {
        println!("  {} created config at {}", "✓".green(), path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            path.display()
        );
    }

    let history_dir = get_data_path().join("history");
    std::fs::create_dir_all(&history_dir)
        .with_context(|| format!("failed to create {}", history_dir.display()))?;
    println!("  {} history dir at {}", "✓".green(), history_dir.display());

    println!();
    println!(
        "{}",
        "  Setup complete! Add sessions to the config, then run `iris gateway`.".green()
    );
    println!();

    Ok(())
}

/// Write a default config at `path` unless one exists. Returns whether it wrote.
fn ensure_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use iris_core::config::load_config;

    #[test]
    fn ensure_config_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(ensure_config(&path).unwrap());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["history"]["duration"], "168h");
        assert_eq!(raw["gateway"]["eventBuffer"], 256);

        let config = load_config(Some(&path));
        assert_eq!(config.gateway.nick, "iris");
    }

    #[test]
    fn ensure_config_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"gateway":{"nick":"custom"}}"#).unwrap();

        assert!(!ensure_config(&path).unwrap());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"gateway":{"nick":"custom"}}"#
        );
    }
}
