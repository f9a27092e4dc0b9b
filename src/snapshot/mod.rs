//! Snapshot documents: the full calendar and the two highlight lists

mod assembler;
mod writer;

pub use assembler::SnapshotAssembler;
pub use writer::{SnapshotError, SnapshotWriter, CALENDAR_FILE, DAILY_FILE, WEEKLY_FILE};

use crate::fixtures::Fixture;
use crate::form::TeamFormRecord;
use crate::market::{MarketPick, RiskBucket};
use crate::model::Outcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything known about one fixture
///
/// Both form records travel with the row, match by match, so every
/// suggestion can be traced back to the results behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMatchRow {
    pub fixture: Fixture,
    pub home_form: TeamFormRecord,
    pub away_form: TeamFormRecord,
    pub model: Outcome,
    pub pick: MarketPick,
}

impl CalendarMatchRow {
    pub fn kickoff(&self) -> DateTime<Utc> {
        self.fixture.kickoff
    }

    pub fn fixture_id(&self) -> u64 {
        self.fixture.id
    }
}

/// Compact entry of a highlight list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightItem {
    pub fixture_id: u64,
    pub kickoff: DateTime<Utc>,
    pub league_id: u32,
    pub league: String,
    pub home: String,
    pub away: String,
    pub market: String,
    pub win_probability: f64,
    pub risk: RiskBucket,
    pub score: f64,
    pub home_form: String,
    pub away_form: String,
}

impl From<&CalendarMatchRow> for HighlightItem {
    fn from(row: &CalendarMatchRow) -> Self {
        Self {
            fixture_id: row.fixture.id,
            kickoff: row.fixture.kickoff,
            league_id: row.fixture.league.id,
            league: row.fixture.league.name.clone(),
            home: row.fixture.home.name.clone(),
            away: row.fixture.away.name.clone(),
            market: row.pick.market.clone(),
            win_probability: row.pick.win_probability,
            risk: row.pick.risk,
            score: row.pick.score,
            home_form: row.home_form.form_string(),
            away_form: row.away_form.form_string(),
        }
    }
}

/// `calendar_7d.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDocument {
    pub generated_at: DateTime<Utc>,
    pub matches: Vec<CalendarMatchRow>,
}

/// `radar_day.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDocument {
    pub generated_at: DateTime<Utc>,
    pub highlights: Vec<HighlightItem>,
}

/// `radar_week.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDocument {
    pub generated_at: DateTime<Utc>,
    pub items: Vec<HighlightItem>,
}

/// The three documents of one run
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub calendar: CalendarDocument,
    pub daily: DailyDocument,
    pub weekly: WeeklyDocument,
}
