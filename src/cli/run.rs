//! Run command implementation

use super::{build_client, parse_now};
use crate::config::Config;
use crate::form::FormCache;
use crate::pipeline::Pipeline;
use crate::snapshot::{Snapshot, SnapshotWriter};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Reference time (RFC 3339) used instead of the clock
    #[arg(long, value_parser = parse_now)]
    pub now: Option<DateTime<Utc>>,

    /// Write documents here instead of `output.dir`
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Run every stage but write neither documents nor cache
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = build_client(config)?;
        let ttl = Duration::hours(config.form.ttl_hours);
        let cache = match &config.form.cache_path {
            Some(path) => FormCache::load(path, ttl),
            None => FormCache::in_memory(ttl),
        };

        let now = self.now.unwrap_or_else(Utc::now);
        let snapshot = Pipeline::new(&client, config, &cache).run(now).await;

        if self.dry_run {
            tracing::info!("Dry run, nothing written");
            print_summary(&snapshot);
            return Ok(());
        }

        let dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| config.output.dir.clone());
        let written = SnapshotWriter::new(dir).write(&snapshot)?;
        for path in &written {
            println!("{}", path.display());
        }

        if let Err(e) = cache.save().await {
            tracing::warn!(error = %e, "Could not save form cache");
        }
        Ok(())
    }
}

fn print_summary(snapshot: &Snapshot) {
    println!(
        "{} fixtures, generated at {}",
        snapshot.calendar.matches.len(),
        snapshot.calendar.generated_at.to_rfc3339()
    );
    println!("Today:");
    for item in &snapshot.daily.highlights {
        println!(
            "  {} {} v {} | {} {:.0}% ({})",
            item.kickoff.format("%a %H:%M"),
            item.home,
            item.away,
            item.market,
            item.win_probability * 100.0,
            item.risk
        );
    }
    println!("This week:");
    for item in &snapshot.weekly.items {
        println!(
            "  {} [{}] {} v {} | {} ({})",
            item.kickoff.format("%a %d %b %H:%M"),
            item.league,
            item.home,
            item.away,
            item.market,
            item.risk
        );
    }
}
