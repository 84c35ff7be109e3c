//! Iris CLI: entry point.
//!
//! # Commands
//!
//! - `iris gateway [--logs]`: run the gateway against the console chat client
//! - `iris status [--json]`: show configuration and seeded sessions
//! - `iris onboard`: write a default config
//!
//! Every command accepts `--config <PATH>` to use a config file other than
//! `~/.iris/config.json`.

mod console;
mod gateway;
mod helpers;
mod onboard;
mod status;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Iris: chat relay gateway with channel history and push notifications
#[derive(Parser)]
#[command(name = "iris", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.iris/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway with the interactive console chat client
    Gateway {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Initialize configuration
    Onboard,

    /// Show configuration and seeded sessions
    Status {
        /// Print the effective config as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path: Option<PathBuf> = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Gateway { logs } => {
            init_logging(logs);
            gateway::run(config_path.as_deref()).await
        }
        Commands::Onboard => onboard::run(config_path.as_deref()),
        Commands::Status { json } => status::run(config_path.as_deref(), json),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("iris=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
