//! Team form: recent finished matches per team, cached between runs

mod aggregator;
mod cache;

pub use aggregator::{FormAggregator, FINISHED_STATUSES};
pub use cache::{CacheError, CachedForm, FormCache};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side a team played on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

/// Result from the team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl MatchResult {
    pub fn from_goals(goals_for: u32, goals_against: u32) -> Self {
        match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => MatchResult::Win,
            std::cmp::Ordering::Equal => MatchResult::Draw,
            std::cmp::Ordering::Less => MatchResult::Loss,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            MatchResult::Win => 'W',
            MatchResult::Draw => 'D',
            MatchResult::Loss => 'L',
        }
    }

    /// League points: 3 for a win, 1 for a draw
    pub fn points(&self) -> u32 {
        match self {
            MatchResult::Win => 3,
            MatchResult::Draw => 1,
            MatchResult::Loss => 0,
        }
    }
}

/// One finished match in a team's recent history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormMatch {
    pub fixture_id: u64,
    pub date: DateTime<Utc>,
    pub venue: Venue,
    pub opponent: String,
    /// Final score as "home-away"
    pub score: String,
    pub goals_for: u32,
    pub goals_against: u32,
    pub result: MatchResult,
}

/// A team's last N finished matches, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamFormRecord {
    pub team_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub league_id: u32,
    pub season: i32,
    /// Matches actually available, never more than requested
    pub window: usize,
    pub matches: Vec<FormMatch>,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Neutral stand-in built when no history could be fetched
    #[serde(default)]
    pub fallback: bool,
}

impl TeamFormRecord {
    /// Record from matches already sorted newest first
    pub fn from_matches(
        team_id: u32,
        team_name: Option<String>,
        league_id: u32,
        season: i32,
        matches: Vec<FormMatch>,
    ) -> Self {
        let goals_for = matches.iter().map(|m| m.goals_for).sum();
        let goals_against = matches.iter().map(|m| m.goals_against).sum();
        Self {
            team_id,
            team_name,
            league_id,
            season,
            window: matches.len(),
            matches,
            goals_for,
            goals_against,
            fallback: false,
        }
    }

    /// Empty record standing in for an unavailable history
    pub fn fallback(team_id: u32, team_name: Option<String>, league_id: u32, season: i32) -> Self {
        Self {
            fallback: true,
            ..Self::from_matches(team_id, team_name, league_id, season, Vec::new())
        }
    }

    /// Record limited to the newest `window` matches, totals recomputed
    pub fn truncated(self, window: usize) -> Self {
        if self.window <= window && self.matches.len() <= window {
            return self;
        }
        let mut matches = self.matches;
        matches.truncate(window);
        Self {
            fallback: self.fallback,
            ..Self::from_matches(self.team_id, self.team_name, self.league_id, self.season, matches)
        }
    }

    pub fn has_history(&self) -> bool {
        self.window > 0
    }

    /// Results newest first, e.g. "WWDLW"
    pub fn form_string(&self) -> String {
        self.matches.iter().map(|m| m.result.letter()).collect()
    }

    pub fn form_points(&self) -> u32 {
        self.matches.iter().map(|m| m.result.points()).sum()
    }

    /// Goals scored per match, `None` without history
    pub fn attack_rate(&self) -> Option<f64> {
        self.has_history()
            .then(|| f64::from(self.goals_for) / self.window as f64)
    }

    /// Goals conceded per match, `None` without history
    pub fn defence_rate(&self) -> Option<f64> {
        self.has_history()
            .then(|| f64::from(self.goals_against) / self.window as f64)
    }
}
