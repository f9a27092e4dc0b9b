//! End-to-end pipeline tests against a scripted provider

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use matchday_radar::config::Config;
use matchday_radar::form::FormCache;
use matchday_radar::market::RiskBucket;
use matchday_radar::pipeline::Pipeline;
use matchday_radar::provider::{Provider, ProviderError};
use matchday_radar::snapshot::{SnapshotWriter, CALENDAR_FILE, DAILY_FILE, WEEKLY_FILE};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_test::assert_ok;

const CONFIG: &str = r#"
    [provider]
    concurrency = 3

    [[leagues]]
    id = 39
    name = "Premier League"
    country = "England"
"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 10, 6, 0, 0).unwrap()
}

fn team_name(id: u32) -> String {
    format!("Team {}", id)
}

fn fixture(id: u64, date: &str, status: &str, home: u32, away: u32, goals: Option<(u32, u32)>) -> Value {
    json!({
        "fixture": { "id": id, "date": date, "status": { "short": status } },
        "league": { "id": 39, "name": "Premier League", "country": "England", "season": 2025 },
        "teams": {
            "home": { "id": home, "name": team_name(home) },
            "away": { "id": away, "name": team_name(away) }
        },
        "goals": { "home": goals.map(|g| g.0), "away": goals.map(|g| g.1) }
    })
}

/// Five finished matches for `team`, all with the given score from its side
fn history(team: u32, goals_for: u32, goals_against: u32) -> Value {
    let items: Vec<Value> = (0..5u64)
        .map(|i| {
            let date = format!("2025-08-{:02}T15:00:00+00:00", 30 - i * 5);
            fixture(
                u64::from(team) * 1000 + i,
                &date,
                "FT",
                team,
                900 + i as u32,
                Some((goals_for, goals_against)),
            )
        })
        .collect();
    envelope(items)
}

fn envelope(items: Vec<Value>) -> Value {
    json!({ "errors": [], "results": items.len(), "response": items })
}

/// Provider serving one league's fixtures and per-team histories
struct MockProvider {
    fixtures: Value,
    histories: HashMap<u32, Value>,
    failing_teams: Vec<u32>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new() -> Self {
        let fixtures = envelope(vec![
            fixture(1003, "2025-09-13T14:00:00+00:00", "NS", 5, 6, None),
            fixture(1001, "2025-09-10T18:00:00+00:00", "NS", 1, 2, None),
            fixture(1000, "2025-09-09T18:00:00+00:00", "FT", 1, 3, Some((2, 0))),
            fixture(1002, "2025-09-11T14:00:00+00:00", "NS", 3, 4, None),
        ]);
        let mut histories = HashMap::new();
        histories.insert(1, history(1, 3, 0));
        histories.insert(2, history(2, 0, 3));
        histories.insert(3, history(3, 1, 1));
        histories.insert(4, history(4, 1, 1));
        histories.insert(5, history(5, 2, 1));
        Self {
            fixtures,
            histories,
            failing_teams: vec![6],
            calls: Mutex::new(Vec::new()),
        }
    }

    fn team_calls(&self, team: u32) -> usize {
        let needle = format!("team={}&", team);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(&needle))
            .count()
    }
}

fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

#[async_trait]
impl Provider for MockProvider {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ProviderError> {
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}?{}&", path, rendered.join("&")));

        if path != "/fixtures" {
            return Ok(envelope(Vec::new()));
        }
        if let Some(team) = param(params, "team").and_then(|t| t.parse::<u32>().ok()) {
            if self.failing_teams.contains(&team) {
                return Err(ProviderError::Status {
                    status: 503,
                    url: format!("https://provider.test{}", path),
                    body: "Service Unavailable".to_string(),
                });
            }
            return Ok(self
                .histories
                .get(&team)
                .cloned()
                .unwrap_or_else(|| envelope(Vec::new())));
        }
        if param(params, "league") == Some("39") && param(params, "season") == Some("2025") {
            return Ok(self.fixtures.clone());
        }
        Ok(envelope(Vec::new()))
    }
}

fn config() -> Config {
    assert_ok!(Config::from_toml_str(CONFIG))
}

#[tokio::test]
async fn test_pipeline_builds_calendar() {
    let provider = MockProvider::new();
    let config = config();
    let cache = FormCache::in_memory(Duration::hours(20));

    let snapshot = Pipeline::new(&provider, &config, &cache).run(now()).await;

    let ids: Vec<u64> = snapshot
        .calendar
        .matches
        .iter()
        .map(|r| r.fixture.id)
        .collect();
    assert_eq!(ids, vec![1001, 1002, 1003]);
    assert_eq!(snapshot.calendar.generated_at, now());

    let dominant = &snapshot.calendar.matches[0];
    assert_eq!(dominant.home_form.form_string(), "WWWWW");
    assert_eq!(dominant.away_form.form_string(), "LLLLL");
    assert_eq!(dominant.pick.market, "1X");
    assert_eq!(dominant.pick.risk, RiskBucket::Low);
    assert!(dominant.pick.loss_probability < 0.30);

    let with_fallback = &snapshot.calendar.matches[2];
    assert!(with_fallback.away_form.fallback);
    assert_eq!(with_fallback.away_form.window, 0);
    assert!(!with_fallback.home_form.fallback);

    for row in &snapshot.calendar.matches {
        let m = &row.model;
        assert!((m.p_home_win + m.p_draw + m.p_away_win - 1.0).abs() < 1e-6);
        assert!(row.home_form.window <= config.form.window);
    }

    assert_eq!(snapshot.daily.highlights.len(), 3);
    assert_eq!(snapshot.weekly.items.len(), 3);
    assert_eq!(snapshot.weekly.items[0].fixture_id, 1001);
}

#[tokio::test]
async fn test_identical_inputs_give_identical_calendar() {
    let provider = MockProvider::new();
    let config = config();
    let cache = FormCache::in_memory(Duration::hours(20));
    let pipeline = Pipeline::new(&provider, &config, &cache);

    let first = pipeline.run(now()).await;
    let second = pipeline.run(now()).await;

    let first_docs = assert_ok!(SnapshotWriter::render(&first));
    let second_docs = assert_ok!(SnapshotWriter::render(&second));
    assert_eq!(first_docs, second_docs);

    // The second run is served from the cache
    assert_eq!(provider.team_calls(1), 1);
}

#[tokio::test]
async fn test_cache_file_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("cache").join("team_form.json");
    let out_dir = dir.path().join("out");
    let config = config();

    let provider = MockProvider::new();
    let cache = FormCache::load(&cache_path, Duration::hours(20));
    let snapshot = Pipeline::new(&provider, &config, &cache).run(now()).await;
    assert_ok!(cache.save().await);
    let written = assert_ok!(SnapshotWriter::new(&out_dir).write(&snapshot));
    assert_eq!(written.len(), 3);
    for name in [CALENDAR_FILE, DAILY_FILE, WEEKLY_FILE] {
        assert!(out_dir.join(name).exists());
    }

    // Fallback records are not persisted
    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(&cache_path).unwrap()).unwrap();
    assert!(saved.get("1").is_some());
    assert!(saved.get("6").is_none());

    // A later run within the TTL does not refetch team form
    let provider = MockProvider::new();
    let cache = FormCache::load(&cache_path, Duration::hours(20));
    let later = now() + Duration::hours(2);
    let snapshot = Pipeline::new(&provider, &config, &cache).run(later).await;
    assert_eq!(provider.team_calls(1), 0);
    assert_eq!(provider.team_calls(6), 1);
    assert_eq!(snapshot.calendar.matches[0].home_form.form_string(), "WWWWW");
}

#[tokio::test]
async fn test_unresolvable_leagues_give_empty_snapshot() {
    let provider = MockProvider::new();
    let config = assert_ok!(Config::from_toml_str(
        r#"
        [[leagues]]
        search = "Nowhere League"
        "#
    ));
    let cache = FormCache::in_memory(Duration::hours(20));
    let snapshot = Pipeline::new(&provider, &config, &cache).run(now()).await;
    assert!(snapshot.calendar.matches.is_empty());
    assert!(snapshot.daily.highlights.is_empty());
    assert!(snapshot.weekly.items.is_empty());
}
