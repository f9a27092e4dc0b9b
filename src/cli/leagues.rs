//! Leagues command implementation

use super::{build_client, parse_now};
use crate::config::Config;
use crate::league::LeagueResolver;
use chrono::{DateTime, Utc};
use clap::Args;

#[derive(Args, Debug)]
pub struct LeaguesArgs {
    /// Reference time (RFC 3339) for season labels
    #[arg(long, value_parser = parse_now)]
    pub now: Option<DateTime<Utc>>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl LeaguesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = build_client(config)?;
        let today = self.now.unwrap_or_else(Utc::now).date_naive();
        let leagues = LeagueResolver::new(&client, today)
            .with_concurrency(config.provider.concurrency)
            .resolve_all(&config.leagues)
            .await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&leagues)?);
            return Ok(());
        }

        println!("{:>6}  {:<32} {:<16} season", "id", "name", "country");
        for league in &leagues {
            println!(
                "{:>6}  {:<32} {:<16} {}",
                league.id,
                league.name,
                league.country,
                league.season_rule.season_for(today)
            );
        }
        println!("{} leagues from {} specs", leagues.len(), config.leagues.len());
        Ok(())
    }
}
