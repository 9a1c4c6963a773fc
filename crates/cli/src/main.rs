//! Free Tier Watcher CLI
//!
//! A command-line tool for checking Oracle Cloud free tier usage through a
//! running watcher.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, usage};
use watcher_lib::classifier::Severity;

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Exit code when a report reaches the `--fail-on` severity
const EXIT_THRESHOLD_REACHED: i32 = 2;

/// Free Tier Watcher CLI
#[derive(Parser)]
#[command(name = "tw")]
#[command(author, version, about = "CLI for the Oracle Cloud Free Tier Watcher", long_about = None)]
pub struct Cli {
    /// Watcher URL (can also be set via TW_API_URL env var or the config file)
    #[arg(long, env = "TW_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as X-API-Key
    #[arg(long, env = "TW_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the watcher is up
    Health,

    /// Show the always-free limits
    Limits,

    /// Show detailed usage per resource
    Usage {
        /// Exit with code 2 when usage reaches this severity (ok, attention, warning, critical)
        #[arg(long)]
        fail_on: Option<Severity>,
    },

    /// Show the overall usage status
    Status {
        /// Exit with code 2 when usage reaches this severity (ok, attention, warning, critical)
        #[arg(long)]
        fail_on: Option<Severity>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = config::Config::load()?;

    let api_url = cli
        .api_url
        .or(file_config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_key = cli.api_key.or(file_config.api_key);

    // Initialize client
    let client = client::ApiClient::new(&api_url, api_key)?;

    // Execute command
    let (status, fail_on) = match cli.command {
        Commands::Health => {
            health::show_health(&client, cli.format).await?;
            return Ok(());
        }
        Commands::Limits => {
            health::show_limits(&client, cli.format).await?;
            return Ok(());
        }
        Commands::Usage { fail_on } => (usage::show_usage(&client, cli.format).await?, fail_on),
        Commands::Status { fail_on } => (usage::show_status(&client, cli.format).await?, fail_on),
    };

    if let Some(threshold) = fail_on {
        if usage::exceeds(status, threshold) {
            std::process::exit(EXIT_THRESHOLD_REACHED);
        }
    }

    Ok(())
}
