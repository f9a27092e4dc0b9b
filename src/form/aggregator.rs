//! Recent form from finished fixtures

use super::{FormCache, FormMatch, MatchResult, TeamFormRecord, Venue};
use crate::fixtures::wire::{parse_entries, ApiFixtureEntry};
use crate::fixtures::TeamRef;
use crate::provider::{response_items, Provider, ProviderError};
use chrono::{DateTime, Utc};

/// Provider status codes of finished matches
pub const FINISHED_STATUSES: &[&str] = &["FT", "AET", "PEN"];

/// Builds team form records, going through the cache
pub struct FormAggregator<'a> {
    provider: &'a dyn Provider,
    cache: &'a FormCache,
    window: usize,
}

impl<'a> FormAggregator<'a> {
    /// Aggregator keeping at most `window` matches per team
    pub fn new(provider: &'a dyn Provider, cache: &'a FormCache, window: usize) -> Self {
        Self {
            provider,
            cache,
            window,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Form of `team`, from the cache when fresh
    ///
    /// Never fails: a failed refresh yields the stale entry or a neutral
    /// fallback record. Cached records written under a wider window are cut
    /// down to this aggregator's window.
    pub async fn team_form(
        &self,
        team: &TeamRef,
        league_id: u32,
        season: i32,
        now: DateTime<Utc>,
    ) -> TeamFormRecord {
        let record = self
            .cache
            .get_or_refresh(
                team.id,
                now,
                || self.fetch(team, league_id, season),
                || TeamFormRecord::fallback(team.id, team_name(team), league_id, season),
            )
            .await;
        if record.window > self.window {
            tracing::debug!(
                team_id = team.id,
                cached = record.window,
                window = self.window,
                "Trimming cached form to window"
            );
        }
        record.truncated(self.window)
    }

    /// Last finished matches of `team` straight from the provider
    pub async fn fetch(
        &self,
        team: &TeamRef,
        league_id: u32,
        season: i32,
    ) -> Result<TeamFormRecord, ProviderError> {
        let params = [
            ("team", team.id.to_string()),
            ("last", self.window.to_string()),
            ("status", FINISHED_STATUSES.join("-")),
        ];
        let body = self.provider.get("/fixtures", &params).await?;
        let entries = parse_entries(response_items(&body));
        let record = build_record(team, league_id, season, &entries, self.window);

        tracing::debug!(
            team_id = team.id,
            returned = entries.len(),
            window = record.window,
            form = %record.form_string(),
            "Refreshed team form"
        );
        Ok(record)
    }
}

/// Record from raw fixtures, seen from `team`'s side
///
/// Unfinished fixtures, fixtures without the team and fixtures lacking a
/// score or date are ignored. Newest first, at most `window` matches.
pub(crate) fn build_record(
    team: &TeamRef,
    league_id: u32,
    season: i32,
    entries: &[ApiFixtureEntry],
    window: usize,
) -> TeamFormRecord {
    let mut name = team_name(team);
    let mut matches: Vec<FormMatch> = entries
        .iter()
        .filter(|e| FINISHED_STATUSES.contains(&e.status()))
        .filter_map(|e| {
            let match_ = form_match(team.id, e)?;
            if name.is_none() {
                let own = if e.teams.home.id == team.id {
                    &e.teams.home.name
                } else {
                    &e.teams.away.name
                };
                name = Some(own.clone()).filter(|n| !n.is_empty());
            }
            Some(match_)
        })
        .collect();

    matches.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.fixture_id.cmp(&a.fixture_id))
    });
    matches.dedup_by_key(|m| m.fixture_id);
    matches.truncate(window);

    TeamFormRecord::from_matches(team.id, name, league_id, season, matches)
}

fn form_match(team_id: u32, entry: &ApiFixtureEntry) -> Option<FormMatch> {
    let date = entry.kickoff()?;
    let home_goals = entry.goals.home?;
    let away_goals = entry.goals.away?;

    let (venue, opponent, goals_for, goals_against) = if entry.teams.home.id == team_id {
        (Venue::Home, &entry.teams.away.name, home_goals, away_goals)
    } else if entry.teams.away.id == team_id {
        (Venue::Away, &entry.teams.home.name, away_goals, home_goals)
    } else {
        return None;
    };

    Some(FormMatch {
        fixture_id: entry.fixture.id,
        date,
        venue,
        opponent: opponent.clone(),
        score: format!("{}-{}", home_goals, away_goals),
        goals_for,
        goals_against,
        result: MatchResult::from_goals(goals_for, goals_against),
    })
}

fn team_name(team: &TeamRef) -> Option<String> {
    Some(team.name.clone()).filter(|n| !n.is_empty())
}
