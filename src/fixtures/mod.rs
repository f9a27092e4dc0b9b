//! Upcoming fixtures for resolved leagues

mod fetcher;
pub(crate) mod wire;

pub use fetcher::{candidate_seasons, FetchError, FixtureFetcher, UPCOMING_STATUSES};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team as referenced by a fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: u32,
    pub name: String,
}

/// The competition a fixture belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRef {
    pub id: u32,
    pub name: String,
    pub country: String,
}

/// A scheduled match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u64,
    pub kickoff: DateTime<Utc>,
    pub home: TeamRef,
    pub away: TeamRef,
    pub league: LeagueRef,
    pub season: i32,
}

impl Fixture {
    /// Sort key used everywhere fixtures are ordered
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.kickoff, self.id)
    }
}
