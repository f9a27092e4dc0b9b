//! End-to-end run: leagues, fixtures, form, model, picks, snapshot

use crate::config::Config;
use crate::fixtures::{Fixture, FixtureFetcher};
use crate::form::{FormAggregator, FormCache, TeamFormRecord};
use crate::league::{LeagueResolver, ResolvedLeague};
use crate::market::{FormBias, MarketSelector};
use crate::model::OutcomeModel;
use crate::provider::Provider;
use crate::snapshot::{CalendarMatchRow, Snapshot, SnapshotAssembler};
use crate::telemetry::{record_latency, set_gauge, GaugeMetric, LatencyMetric};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// One batch run over a provider and a form cache
///
/// `now` is passed in so identical inputs give identical documents.
pub struct Pipeline<'a> {
    provider: &'a dyn Provider,
    config: &'a Config,
    cache: &'a FormCache,
    model: OutcomeModel,
    selector: MarketSelector,
}

impl<'a> Pipeline<'a> {
    pub fn new(provider: &'a dyn Provider, config: &'a Config, cache: &'a FormCache) -> Self {
        Self {
            provider,
            config,
            cache,
            model: OutcomeModel::new(config.model.clone()),
            selector: MarketSelector::new(&config.market),
        }
    }

    /// Run every stage and assemble the snapshot
    pub async fn run(&self, now: DateTime<Utc>) -> Snapshot {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        self.run_stages(now).instrument(span).await
    }

    async fn run_stages(&self, now: DateTime<Utc>) -> Snapshot {
        let start = Instant::now();
        tracing::info!(now = %now, specs = self.config.leagues.len(), "Starting run");

        let leagues = self.resolve_leagues(now).await;
        set_gauge(GaugeMetric::ResolvedLeagues, leagues.len() as f64);

        let fixtures = self.fetch_fixtures(&leagues, now).await;
        let rows = self.build_rows(&fixtures, now).await;
        set_gauge(GaugeMetric::CalendarFixtures, rows.len() as f64);

        let snapshot = SnapshotAssembler::new(self.config.snapshot.clone()).assemble(now, rows);
        set_gauge(
            GaugeMetric::DailyHighlights,
            snapshot.daily.highlights.len() as f64,
        );
        set_gauge(GaugeMetric::WeeklyHighlights, snapshot.weekly.items.len() as f64);

        let elapsed = start.elapsed();
        record_latency(LatencyMetric::PipelineRun, elapsed);
        tracing::info!(
            leagues = leagues.len(),
            fixtures = fixtures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Run complete"
        );
        snapshot
    }

    pub async fn resolve_leagues(&self, now: DateTime<Utc>) -> Vec<ResolvedLeague> {
        LeagueResolver::new(self.provider, now.date_naive())
            .with_concurrency(self.config.provider.concurrency)
            .resolve_all(&self.config.leagues)
            .await
    }

    pub async fn fetch_fixtures(&self, leagues: &[ResolvedLeague], now: DateTime<Utc>) -> Vec<Fixture> {
        FixtureFetcher::new(self.provider, &self.config.window, now.date_naive())
            .with_concurrency(self.config.provider.concurrency)
            .fetch_all(leagues)
            .await
    }

    /// Form, outcome and pick for every fixture, in calendar order
    pub async fn build_rows(&self, fixtures: &[Fixture], now: DateTime<Utc>) -> Vec<CalendarMatchRow> {
        let aggregator = FormAggregator::new(self.provider, self.cache, self.config.form.window);
        let aggregator = &aggregator;

        let mut rows: Vec<CalendarMatchRow> = stream::iter(fixtures)
            .map(|fixture| async move {
                let (home_form, away_form) = tokio::join!(
                    aggregator.team_form(&fixture.home, fixture.league.id, fixture.season, now),
                    aggregator.team_form(&fixture.away, fixture.league.id, fixture.season, now),
                );
                self.score(fixture.clone(), home_form, away_form)
            })
            .buffer_unordered(self.config.provider.concurrency.max(1))
            .collect()
            .await;

        rows.sort_by_key(|r| (r.kickoff(), r.fixture_id()));
        rows
    }

    fn score(
        &self,
        fixture: Fixture,
        home_form: TeamFormRecord,
        away_form: TeamFormRecord,
    ) -> CalendarMatchRow {
        let model = self.model.evaluate(&home_form, &away_form);
        let pick = self
            .selector
            .select(&model, FormBias::from_records(&home_form, &away_form));
        tracing::debug!(
            fixture_id = fixture.id,
            home = %fixture.home.name,
            away = %fixture.away.name,
            market = %pick.market,
            loss = pick.loss_probability,
            risk = %pick.risk,
            "Scored fixture"
        );
        CalendarMatchRow {
            fixture,
            home_form,
            away_form,
            model,
            pick,
        }
    }
}
