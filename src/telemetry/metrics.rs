//! Run metrics
//!
//! Recorded through the `metrics` facade; they are no-ops unless the host
//! process installs a recorder.

use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Requests sent to the provider (including retries)
    ProviderRequests,
    /// Retries scheduled after a retriable failure
    ProviderRetries,
    /// Requests that failed after exhausting the policy
    ProviderFailures,
    /// League specs that resolved to nothing
    LeaguesSkipped,
    /// Leagues whose fixtures could not be fetched
    FixtureLeaguesFailed,
    /// Team forms served from a fresh cache entry
    FormCacheHits,
    /// Team forms fetched from the provider
    FormRefreshes,
    /// Team forms that fell back to a stale entry or a neutral record
    FormFallbacks,
    /// Outcomes replaced by the neutral distribution
    ModelDegenerate,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Leagues resolved this run
    ResolvedLeagues,
    /// Fixtures in the calendar
    CalendarFixtures,
    /// Entries in the daily highlights
    DailyHighlights,
    /// Entries in the weekly highlights
    WeeklyHighlights,
    /// Entries in the team form cache
    FormCacheEntries,
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Single provider HTTP request
    ProviderRequest,
    /// Whole pipeline run
    PipelineRun,
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::ProviderRequests => "radar_provider_requests_total",
        CounterMetric::ProviderRetries => "radar_provider_retries_total",
        CounterMetric::ProviderFailures => "radar_provider_failures_total",
        CounterMetric::LeaguesSkipped => "radar_leagues_skipped_total",
        CounterMetric::FixtureLeaguesFailed => "radar_fixture_leagues_failed_total",
        CounterMetric::FormCacheHits => "radar_form_cache_hits_total",
        CounterMetric::FormRefreshes => "radar_form_refreshes_total",
        CounterMetric::FormFallbacks => "radar_form_fallbacks_total",
        CounterMetric::ModelDegenerate => "radar_model_degenerate_total",
    }
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    let name = counter_name(metric);
    metrics::counter!(name).increment(1);
    tracing::trace!(metric = name, "Counter incremented");
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::ResolvedLeagues => "radar_resolved_leagues",
        GaugeMetric::CalendarFixtures => "radar_calendar_fixtures",
        GaugeMetric::DailyHighlights => "radar_daily_highlights",
        GaugeMetric::WeeklyHighlights => "radar_weekly_highlights",
        GaugeMetric::FormCacheEntries => "radar_form_cache_entries",
    };
    metrics::gauge!(name).set(value);
    tracing::debug!(metric = name, value = value, "Setting gauge");
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let name = match metric {
        LatencyMetric::ProviderRequest => "radar_provider_request_latency_ms",
        LatencyMetric::PipelineRun => "radar_pipeline_run_latency_ms",
    };
    metrics::histogram!(name).record(duration.as_secs_f64() * 1000.0);
}
