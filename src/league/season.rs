//! Season label rules

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// First month of a split-year season (July)
pub const SPLIT_SEASON_START_MONTH: u32 = 7;

/// How a league labels its seasons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonRule {
    /// Season runs within one calendar year and is labelled by it
    CalendarYear,
    /// Season spans two calendar years and is labelled by its starting year
    #[default]
    SplitYear,
}

impl SeasonRule {
    /// Season label in effect on `today`
    pub fn season_for(&self, today: NaiveDate) -> i32 {
        match self {
            SeasonRule::CalendarYear => today.year(),
            SeasonRule::SplitYear => {
                if today.month() >= SPLIT_SEASON_START_MONTH {
                    today.year()
                } else {
                    today.year() - 1
                }
            }
        }
    }
}
