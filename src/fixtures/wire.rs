//! API-Football fixture payload shapes
//!
//! Shared by the fixture fetcher and the form aggregator; both read the same
//! `/fixtures` items.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiFixtureEntry {
    pub fixture: ApiFixture,
    pub league: ApiLeagueRef,
    pub teams: ApiTeams,
    #[serde(default)]
    pub goals: ApiGoals,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiFixture {
    pub id: u64,
    pub date: String,
    #[serde(default)]
    pub status: ApiStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiStatus {
    #[serde(default)]
    pub short: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiLeagueRef {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub season: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiTeams {
    pub home: ApiTeam,
    pub away: ApiTeam,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiTeam {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiGoals {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

impl ApiFixtureEntry {
    /// Kickoff in UTC, if the provider date is RFC 3339
    pub fn kickoff(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.fixture.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn status(&self) -> &str {
        &self.fixture.status.short
    }
}

/// Entries of a `/fixtures` response; items that do not parse are dropped
pub(crate) fn parse_entries(items: &[Value]) -> Vec<ApiFixtureEntry> {
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping unparsable fixture item");
                None
            }
        })
        .collect()
}
