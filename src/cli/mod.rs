//! CLI interface for matchday-radar
//!
//! Provides subcommands for:
//! - `run`: Full pipeline, writes the snapshot documents
//! - `leagues`: Resolve configured leagues and print them
//! - `config`: Show the effective configuration

mod leagues;
mod run;

pub use leagues::LeaguesArgs;
pub use run::RunArgs;

use crate::config::Config;
use crate::provider::{ClientConfig, RateLimitedClient};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "matchday-radar")]
#[command(about = "Ranked, explainable market suggestions for upcoming football fixtures")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline and write the snapshot
    Run(RunArgs),
    /// Resolve configured leagues and print them
    Leagues(LeaguesArgs),
    /// Show the effective configuration
    Config,
}

/// Provider client from configuration; fails before any request is made
pub(crate) fn build_client(config: &Config) -> anyhow::Result<RateLimitedClient> {
    let api_key = config.api_key()?;
    let client = RateLimitedClient::new(ClientConfig::from_provider_config(
        &config.provider,
        api_key,
    ))?;
    Ok(client)
}

/// Parse an RFC 3339 reference time
pub(crate) fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 time (e.g. 2025-09-10T06:00:00Z): {}", e))
}

/// Effective configuration rendered as TOML
pub fn render_config(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
