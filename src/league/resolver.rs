//! League spec resolution against the provider

use super::scoring::{
    rank_candidates, select_regional_divisions, LeagueCandidate, ScoreWeights, SearchQuery,
};
use super::{ExpansionRule, LeagueSpec, ResolvedLeague, SeasonRule};
use crate::provider::{response_items, Provider, ProviderError};
use crate::telemetry::{increment, CounterMetric};
use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Why a single spec produced no league
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("no league matches {0}")]
    NoMatch(String),
}

/// Resolves league specs into concrete leagues
pub struct LeagueResolver<'a> {
    provider: &'a dyn Provider,
    today: NaiveDate,
    weights: ScoreWeights,
    concurrency: usize,
}

impl<'a> LeagueResolver<'a> {
    /// Create a resolver computing seasons relative to `today`
    pub fn new(provider: &'a dyn Provider, today: NaiveDate) -> Self {
        Self {
            provider,
            today,
            weights: ScoreWeights::default(),
            concurrency: 1,
        }
    }

    /// Resolve up to `n` specs at once
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Override the search scoring weights
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Resolve every spec, skipping failures, deduplicated by league id
    ///
    /// Output follows spec order; the first spec yielding an id keeps it.
    pub async fn resolve_all(&self, specs: &[LeagueSpec]) -> Vec<ResolvedLeague> {
        let mut results: Vec<(usize, Result<Vec<ResolvedLeague>, ResolveError>)> =
            stream::iter(specs.iter().enumerate())
                .map(|(i, spec)| async move { (i, self.resolve(spec).await) })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(i, _)| *i);

        let mut seen = HashSet::new();
        let mut leagues = Vec::new();
        for (i, result) in results {
            match result {
                Ok(resolved) => {
                    for league in resolved {
                        if seen.insert(league.id) {
                            leagues.push(league);
                        }
                    }
                }
                Err(e) => {
                    increment(CounterMetric::LeaguesSkipped);
                    tracing::warn!(spec = %specs[i].describe(), error = %e, "Skipping league spec");
                }
            }
        }

        tracing::info!(
            specs = specs.len(),
            leagues = leagues.len(),
            "Resolved leagues"
        );
        leagues
    }

    /// Resolve one spec
    pub async fn resolve(&self, spec: &LeagueSpec) -> Result<Vec<ResolvedLeague>, ResolveError> {
        match spec {
            LeagueSpec::Id {
                id,
                name,
                country,
                season_rule,
            } => Ok(vec![ResolvedLeague {
                id: *id,
                name: name.clone().unwrap_or_default(),
                country: country.clone().unwrap_or_default(),
                season_rule: *season_rule,
            }]),
            LeagueSpec::Search {
                search,
                country,
                kind,
                season_rule,
            } => {
                let query = SearchQuery {
                    name: search.clone(),
                    country: country.clone(),
                    kind: kind.clone(),
                };
                self.search(&query, *season_rule).await.map(|l| vec![l])
            }
            LeagueSpec::Expand {
                expand,
                country,
                season_rule,
            } => self.expand(*expand, country, *season_rule).await,
        }
    }

    /// Best-scoring league for a search query
    async fn search(
        &self,
        query: &SearchQuery,
        season_rule: SeasonRule,
    ) -> Result<ResolvedLeague, ResolveError> {
        let season = season_rule.season_for(self.today);
        let mut candidates = self.search_candidates(query, Some(season)).await?;
        if candidates.is_empty() {
            tracing::debug!(
                query = %query.name,
                season,
                "No search results for season, retrying without season filter"
            );
            candidates = self.search_candidates(query, None).await?;
        }

        let ranked = rank_candidates(query, &candidates, &self.weights);
        let best = ranked
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NoMatch(format!("search '{}'", query.name)))?;

        tracing::debug!(
            query = %query.name,
            league_id = best.candidate.id,
            league = %best.candidate.name,
            score = best.score,
            "Search resolved"
        );
        Ok(ResolvedLeague {
            id: best.candidate.id,
            name: best.candidate.name,
            country: best.candidate.country,
            season_rule,
        })
    }

    /// Raw candidates from the provider's league search
    pub async fn search_candidates(
        &self,
        query: &SearchQuery,
        season: Option<i32>,
    ) -> Result<Vec<LeagueCandidate>, ProviderError> {
        let mut params: Vec<(&str, String)> = vec![("search", query.name.trim().to_string())];
        if let Some(country) = &query.country {
            params.push(("country", country.clone()));
        }
        if let Some(kind) = &query.kind {
            params.push(("type", kind.to_lowercase()));
        }
        if let Some(season) = season {
            params.push(("season", season.to_string()));
        }
        let body = self.provider.get("/leagues", &params).await?;
        Ok(parse_candidates(response_items(&body)))
    }

    async fn expand(
        &self,
        rule: ExpansionRule,
        country: &str,
        season_rule: SeasonRule,
    ) -> Result<Vec<ResolvedLeague>, ResolveError> {
        let season = season_rule.season_for(self.today);
        let params = [("country", country.to_string()), ("season", season.to_string())];
        let body = self.provider.get("/leagues", &params).await?;
        let candidates = parse_candidates(response_items(&body));

        let selected = match rule {
            ExpansionRule::StateTopDivisions => select_regional_divisions(&candidates),
        };
        if selected.is_empty() {
            return Err(ResolveError::NoMatch(format!(
                "expansion {:?} for {} (season {})",
                rule, country, season
            )));
        }

        tracing::debug!(
            country = %country,
            season,
            candidates = candidates.len(),
            selected = selected.len(),
            "Expanded regional divisions"
        );
        Ok(selected
            .into_iter()
            .map(|c| ResolvedLeague {
                id: c.id,
                name: c.name,
                country: c.country,
                season_rule,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiLeagueEntry {
    league: ApiLeague,
    #[serde(default)]
    country: Option<ApiCountry>,
    #[serde(default)]
    seasons: Vec<ApiSeason>,
}

#[derive(Debug, Deserialize)]
struct ApiLeague {
    id: u32,
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ApiCountry {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSeason {
    #[serde(default)]
    current: bool,
}

/// Candidates from a `/leagues` response; malformed entries are skipped
fn parse_candidates(items: &[serde_json::Value]) -> Vec<LeagueCandidate> {
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<ApiLeagueEntry>(item.clone()).ok())
        .map(|entry| LeagueCandidate {
            id: entry.league.id,
            name: entry.league.name,
            country: entry.country.and_then(|c| c.name).unwrap_or_default(),
            kind: entry.league.kind,
            current: entry.seasons.iter().any(|s| s.current),
        })
        .collect()
}
