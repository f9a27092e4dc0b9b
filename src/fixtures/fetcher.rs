//! Fixture fetching with season-label and per-day fallbacks

use super::wire::{parse_entries, ApiFixtureEntry};
use super::{Fixture, LeagueRef, TeamRef};
use crate::config::WindowConfig;
use crate::league::ResolvedLeague;
use crate::provider::{response_items, Provider, ProviderError};
use crate::telemetry::{increment, CounterMetric};
use chrono::{Duration, NaiveDate};
use futures_util::stream::{self, StreamExt};
use std::collections::BTreeMap;
use thiserror::Error;

/// Provider status codes of fixtures that have not kicked off
pub const UPCOMING_STATUSES: &[&str] = &["NS", "TBD"];

/// Season labels tried for a league, in order
///
/// Providers do not always label a season the way the season rule predicts,
/// so the neighbouring labels are tried as well. The first label returning
/// anything is taken, even when a neighbour would have been the right one.
pub fn candidate_seasons(primary: i32) -> [i32; 3] {
    [primary, primary - 1, primary + 1]
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fixtures for league {league_id} unavailable: {source}")]
    Provider {
        league_id: u32,
        #[source]
        source: ProviderError,
    },
}

/// Fetches not-started fixtures inside a day window
pub struct FixtureFetcher<'a> {
    provider: &'a dyn Provider,
    today: NaiveDate,
    days_ahead: u32,
    max_per_league: usize,
    max_total: usize,
    concurrency: usize,
}

impl<'a> FixtureFetcher<'a> {
    /// Window starts on `today` and covers `window.days_ahead` days
    pub fn new(provider: &'a dyn Provider, window: &WindowConfig, today: NaiveDate) -> Self {
        Self {
            provider,
            today,
            days_ahead: window.days_ahead.max(1),
            max_per_league: window.max_per_league,
            max_total: window.max_total,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Days of the window, first to last
    pub fn window_days(&self) -> Vec<NaiveDate> {
        (0..i64::from(self.days_ahead))
            .map(|i| self.today + Duration::days(i))
            .collect()
    }

    /// Fixtures of every league, sorted by kickoff then id, capped globally
    ///
    /// A league that cannot be fetched is logged and left out.
    pub async fn fetch_all(&self, leagues: &[ResolvedLeague]) -> Vec<Fixture> {
        let mut results: Vec<(usize, Result<Vec<Fixture>, FetchError>)> =
            stream::iter(leagues.iter().enumerate())
                .map(|(i, league)| async move { (i, self.fetch_league(league).await) })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(i, _)| *i);

        let mut fixtures = Vec::new();
        for (i, result) in results {
            match result {
                Ok(mut league_fixtures) => fixtures.append(&mut league_fixtures),
                Err(e) => {
                    increment(CounterMetric::FixtureLeaguesFailed);
                    tracing::warn!(
                        league_id = leagues[i].id,
                        league = %leagues[i].name,
                        error = %e,
                        "Skipping league"
                    );
                }
            }
        }

        fixtures.sort_by_key(Fixture::order_key);
        if fixtures.len() > self.max_total {
            tracing::info!(
                total = fixtures.len(),
                cap = self.max_total,
                "Global fixture cap reached"
            );
            fixtures.truncate(self.max_total);
        }
        fixtures
    }

    /// Fixtures of one league, sorted and capped
    pub async fn fetch_league(&self, league: &ResolvedLeague) -> Result<Vec<Fixture>, FetchError> {
        let primary = league.season_rule.season_for(self.today);
        let mut last_error = None;
        let mut answered = false;

        for season in candidate_seasons(primary) {
            match self.fetch_season(league.id, season).await {
                Ok(entries) if entries.is_empty() => answered = true,
                Ok(entries) => {
                    if season != primary {
                        tracing::info!(
                            league_id = league.id,
                            expected = primary,
                            used = season,
                            "Using adjacent season label"
                        );
                    }
                    return Ok(self.collect(league, season, entries));
                }
                Err(e) => {
                    tracing::debug!(
                        league_id = league.id,
                        season,
                        error = %e,
                        "Season query failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) if !answered => Err(FetchError::Provider {
                league_id: league.id,
                source,
            }),
            _ => {
                tracing::debug!(league_id = league.id, "No fixtures in window");
                Ok(Vec::new())
            }
        }
    }

    /// Raw entries for one season label; windowed query first, then per day
    async fn fetch_season(
        &self,
        league_id: u32,
        season: i32,
    ) -> Result<Vec<ApiFixtureEntry>, ProviderError> {
        let days = self.window_days();
        let (Some(from), Some(to)) = (days.first(), days.last()) else {
            return Ok(Vec::new());
        };
        let params = [
            ("league", league_id.to_string()),
            ("season", season.to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
            ("timezone", "UTC".to_string()),
        ];
        match self.provider.get("/fixtures", &params).await {
            Ok(body) => Ok(parse_entries(response_items(&body))),
            Err(e) if !e.is_transient() => {
                tracing::warn!(league_id, season, error = %e, "Windowed fixture query rejected");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    league_id,
                    season,
                    error = %e,
                    "Windowed fixture query failed, falling back to per-day queries"
                );
                self.fetch_by_day(league_id, season, &days, e).await
            }
        }
    }

    async fn fetch_by_day(
        &self,
        league_id: u32,
        season: i32,
        days: &[NaiveDate],
        window_error: ProviderError,
    ) -> Result<Vec<ApiFixtureEntry>, ProviderError> {
        let mut entries = Vec::new();
        let mut failures = 0;
        for day in days {
            let params = [
                ("league", league_id.to_string()),
                ("season", season.to_string()),
                ("date", day.to_string()),
                ("timezone", "UTC".to_string()),
            ];
            match self.provider.get("/fixtures", &params).await {
                Ok(body) => entries.extend(parse_entries(response_items(&body))),
                Err(e) => {
                    failures += 1;
                    tracing::debug!(league_id, season, %day, error = %e, "Day query failed");
                }
            }
        }
        if failures == days.len() {
            return Err(window_error);
        }
        Ok(entries)
    }

    fn collect(
        &self,
        league: &ResolvedLeague,
        season: i32,
        entries: Vec<ApiFixtureEntry>,
    ) -> Vec<Fixture> {
        let raw = entries.len();
        let mut by_id = BTreeMap::new();
        for entry in entries {
            if let Some(fixture) = to_fixture(&entry, league, season) {
                by_id.entry(fixture.id).or_insert(fixture);
            }
        }
        let mut fixtures: Vec<Fixture> = by_id.into_values().collect();
        fixtures.sort_by_key(Fixture::order_key);
        fixtures.truncate(self.max_per_league);

        tracing::info!(
            league_id = league.id,
            league = %league.name,
            season,
            raw,
            kept = fixtures.len(),
            "Fetched fixtures"
        );
        fixtures
    }
}

/// Domain fixture from a provider entry; `None` unless not started and dated
fn to_fixture(entry: &ApiFixtureEntry, league: &ResolvedLeague, season: i32) -> Option<Fixture> {
    if !UPCOMING_STATUSES.contains(&entry.status()) {
        return None;
    }
    let kickoff = entry.kickoff()?;
    let name = if entry.league.name.is_empty() {
        league.name.clone()
    } else {
        entry.league.name.clone()
    };
    let country = entry
        .league
        .country
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| league.country.clone());

    Some(Fixture {
        id: entry.fixture.id,
        kickoff,
        home: TeamRef {
            id: entry.teams.home.id,
            name: entry.teams.home.name.clone(),
        },
        away: TeamRef {
            id: entry.teams.away.id,
            name: entry.teams.away.name.clone(),
        },
        league: LeagueRef {
            id: entry.league.id,
            name,
            country,
        },
        season: entry.league.season.unwrap_or(season),
    })
}
