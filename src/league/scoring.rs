//! Weighted candidate scoring for league search and regional expansion
//!
//! Kept free of I/O so ambiguous cases (several leagues with the same name in
//! different countries, regional divisions with look-alike names) can be
//! asserted on directly.

use serde::Serialize;
use std::collections::BTreeMap;

/// A league as returned by the provider's league listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueCandidate {
    pub id: u32,
    pub name: String,
    pub country: String,
    /// Provider league type ("League", "Cup")
    pub kind: String,
    /// Provider flags one of the league's seasons as current
    pub current: bool,
}

/// What a search spec asks for
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub name: String,
    pub country: Option<String>,
    pub kind: Option<String>,
}

/// Points awarded per matching criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    pub country: i32,
    pub kind: i32,
    pub exact_name: i32,
    pub substring_name: i32,
    pub current_season: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            country: 3,
            kind: 2,
            exact_name: 10,
            substring_name: 4,
            current_season: 1,
        }
    }
}

/// A candidate with its score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: LeagueCandidate,
    pub score: i32,
}

/// Score one candidate against a query
///
/// Exact and substring name matches are exclusive; comparisons ignore case
/// and surrounding whitespace.
pub fn score_candidate(
    query: &SearchQuery,
    candidate: &LeagueCandidate,
    weights: &ScoreWeights,
) -> i32 {
    let mut score = 0;

    if let Some(country) = query.country.as_deref() {
        if eq_ignore_case(country, &candidate.country) {
            score += weights.country;
        }
    }
    if let Some(kind) = query.kind.as_deref() {
        if eq_ignore_case(kind, &candidate.kind) {
            score += weights.kind;
        }
    }

    let wanted = normalize(&query.name);
    let name = normalize(&candidate.name);
    if !wanted.is_empty() {
        if name == wanted {
            score += weights.exact_name;
        } else if name.contains(&wanted) || (!name.is_empty() && wanted.contains(&name)) {
            score += weights.substring_name;
        }
    }

    if candidate.current {
        score += weights.current_season;
    }

    score
}

/// Rank candidates by score (descending), then id (ascending)
pub fn rank_candidates(
    query: &SearchQuery,
    candidates: &[LeagueCandidate],
    weights: &ScoreWeights,
) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|c| ScoredCandidate {
            score: score_candidate(query, c, weights),
            candidate: c.clone(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.candidate.id.cmp(&b.candidate.id))
    });
    ranked
}

/// Name fragments of national competitions, cups and non-senior tiers
const EXCLUDED_MARKERS: &[&str] = &[
    "serie", "série", "copa", "cup", "super", "brasileir", "recopa", "torneio", "taça", "taca",
    "women", "feminin", "u17", "u19", "u20", "u21", "u23", "sub-", "youth", "junior", "júnior",
    "play-off", "playoff",
];

/// Division suffixes marking a regional top tier
const TOP_DIVISION_SUFFIXES: &[&str] = &["1", "A1", "A"];

/// Region name when `name` looks like a regional top division
///
/// Accepts `"<Region> - 1"`, `"<Region> - A1"` and `"<Region> - A"`; rejects
/// anything carrying a national-competition or cup marker.
pub fn regional_top_division(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    if EXCLUDED_MARKERS.iter().any(|m| lower.contains(m)) {
        return None;
    }
    let (region, division) = name.rsplit_once(" - ")?;
    let division = division.trim().to_ascii_uppercase();
    if !TOP_DIVISION_SUFFIXES.contains(&division.as_str()) {
        return None;
    }
    let region = region.trim();
    if region.is_empty() {
        return None;
    }
    Some(region.to_string())
}

/// One league per region among regional top divisions, sorted by id
///
/// Only league-type candidates qualify. When a region has several matches the
/// lowest id wins.
pub fn select_regional_divisions(candidates: &[LeagueCandidate]) -> Vec<LeagueCandidate> {
    let mut by_region: BTreeMap<String, &LeagueCandidate> = BTreeMap::new();
    for candidate in candidates {
        if !eq_ignore_case(&candidate.kind, "league") {
            continue;
        }
        let Some(region) = regional_top_division(&candidate.name) else {
            continue;
        };
        by_region
            .entry(region.to_lowercase())
            .and_modify(|existing| {
                if candidate.id < existing.id {
                    *existing = candidate;
                }
            })
            .or_insert(candidate);
    }
    let mut selected: Vec<LeagueCandidate> = by_region.into_values().cloned().collect();
    selected.sort_by_key(|c| c.id);
    selected
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
