//! Calendar and highlight selection

use super::{
    CalendarDocument, CalendarMatchRow, DailyDocument, HighlightItem, Snapshot, WeeklyDocument,
};
use crate::config::SnapshotConfig;
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Builds the three documents from scored rows
#[derive(Debug, Clone)]
pub struct SnapshotAssembler {
    config: SnapshotConfig,
}

impl SnapshotAssembler {
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    pub fn assemble(&self, now: DateTime<Utc>, rows: Vec<CalendarMatchRow>) -> Snapshot {
        let daily = self.daily(now, &rows);
        let weekly = self.weekly(now, &rows);
        let calendar = self.calendar(now, rows);
        tracing::info!(
            matches = calendar.matches.len(),
            daily = daily.highlights.len(),
            weekly = weekly.items.len(),
            "Assembled snapshot"
        );
        Snapshot {
            calendar,
            daily,
            weekly,
        }
    }

    /// Every row, by kickoff then fixture id
    pub fn calendar(&self, now: DateTime<Utc>, mut rows: Vec<CalendarMatchRow>) -> CalendarDocument {
        rows.sort_by_key(|r| (r.kickoff(), r.fixture_id()));
        CalendarDocument {
            generated_at: now,
            matches: rows,
        }
    }

    /// Best-scored upcoming fixtures of the next day
    ///
    /// When the day horizon holds fewer rows than the limit, every upcoming
    /// row competes.
    pub fn daily(&self, now: DateTime<Utc>, rows: &[CalendarMatchRow]) -> DailyDocument {
        let limit = self.config.daily_limit;
        let horizon = now + Duration::hours(self.config.day_horizon_hours);

        let mut pool: Vec<&CalendarMatchRow> = rows
            .iter()
            .filter(|r| r.kickoff() >= now && r.kickoff() < horizon)
            .collect();
        if pool.len() < limit {
            tracing::debug!(
                within_horizon = pool.len(),
                limit,
                "Widening daily pool to the whole window"
            );
            pool = rows.iter().filter(|r| r.kickoff() >= now).collect();
        }

        pool.sort_by(|a, b| by_score(a, b));
        DailyDocument {
            generated_at: now,
            highlights: pool.into_iter().take(limit).map(HighlightItem::from).collect(),
        }
    }

    /// Lowest-risk upcoming fixtures, capped per competition
    pub fn weekly(&self, now: DateTime<Utc>, rows: &[CalendarMatchRow]) -> WeeklyDocument {
        let mut pool: Vec<&CalendarMatchRow> = rows.iter().filter(|r| r.kickoff() >= now).collect();
        pool.sort_by(|a, b| by_risk(a, b));

        let mut per_league: HashMap<u32, usize> = HashMap::new();
        let mut items = Vec::new();
        for row in pool {
            if items.len() >= self.config.weekly_limit {
                break;
            }
            let taken = per_league.entry(row.fixture.league.id).or_insert(0);
            if *taken >= self.config.per_competition_cap {
                continue;
            }
            *taken += 1;
            items.push(HighlightItem::from(row));
        }

        WeeklyDocument {
            generated_at: now,
            items,
        }
    }
}

fn by_score(a: &CalendarMatchRow, b: &CalendarMatchRow) -> Ordering {
    b.pick
        .score
        .total_cmp(&a.pick.score)
        .then_with(|| a.kickoff().cmp(&b.kickoff()))
        .then_with(|| a.fixture_id().cmp(&b.fixture_id()))
}

fn by_risk(a: &CalendarMatchRow, b: &CalendarMatchRow) -> Ordering {
    a.pick
        .risk
        .cmp(&b.pick.risk)
        .then_with(|| a.kickoff().cmp(&b.kickoff()))
        .then_with(|| a.fixture_id().cmp(&b.fixture_id()))
}
