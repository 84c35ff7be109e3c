//! `iris status`: show configuration and seeded sessions.
//!
//! - Shows config path, nick, autojoin channels, event buffer
//! - Shows the retention window, marking a fallback to the default
//! - Lists configured sessions and whether they can receive pushes

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use iris_core::config::{get_config_path, load_config, Config};

use crate::helpers::{self, mark};

/// Run the status command.
pub fn run(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path);

    if json {
        let rendered =
            serde_json::to_string_pretty(&config).context("failed to render config as JSON")?;
        println!("{rendered}");
        return Ok(());
    }

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "✦ Iris Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        mark(path.exists(), "(not found, using defaults)")
    );
    println!("  {:<18} {}", "Nick:".bold(), config.gateway.nick);
    println!(
        "  {:<18} {}",
        "Autojoin:".bold(),
        if config.gateway.autojoin.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            config.gateway.autojoin.join(" ")
        }
    );
    println!("  {:<18} {}", "Event buffer:".bold(), config.gateway.event_buffer);
    println!("  {:<18} {}", "Retention:".bold(), retention_line(&config));

    println!();
    println!("  {}", "Sessions:".bold());
    if config.sessions.is_empty() {
        println!("    {}", "(none configured)".dimmed());
    }
    for session in &config.sessions {
        let push = if session.push_token.is_empty() {
            format!("{}", "· no push token".dimmed())
        } else {
            format!("{} push", "✓".green())
        };
        println!(
            "    {:<20} {:<16} {}",
            session.username,
            push,
            session.channels.join(" ")
        );
    }
    println!();

    Ok(())
}

/// Retention with its source: `7d` or `7d (invalid "1x", default)`.
fn retention_line(config: &Config) -> String {
    let rendered = helpers::format_duration(config.history.retention());
    if config.history.is_valid() {
        rendered
    } else {
        format!(
            "{} {}",
            rendered,
            format!("(invalid {:?}, default)", config.history.duration).red()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_line_valid() {
        let mut config = Config::default();
        config.history.duration = "1h30m".into();
        assert_eq!(retention_line(&config), "1h30m");
    }

    #[test]
    fn retention_line_default() {
        assert_eq!(retention_line(&Config::default()), "7d");
    }

    #[test]
    fn retention_line_marks_fallback() {
        let mut config = Config::default();
        config.history.duration = "soon".into();
        let line = retention_line(&config);
        assert!(line.starts_with("7d "));
        assert!(line.contains("invalid"));
        assert!(line.contains("soon"));
    }
}
