//! Configuration file integration tests

use matchday_radar::cli::render_config;
use matchday_radar::config::{Config, ConfigError};
use matchday_radar::league::{ExpansionRule, LeagueSpec, SeasonRule};
use tokio_test::{assert_err, assert_ok};

const EXAMPLE: &str = include_str!("../../config.toml.example");

#[test]
fn test_example_config_loads() {
    let config = assert_ok!(Config::from_toml_str(EXAMPLE));
    assert_eq!(config.provider.api_key_env, "API_FOOTBALL_KEY");
    assert_eq!(config.window.days_ahead, 7);
    assert_eq!(config.market.risk.medium_max, 0.45);
    assert_eq!(config.leagues.len(), 4);
    assert!(matches!(
        &config.leagues[3],
        LeagueSpec::Expand {
            expand: ExpansionRule::StateTopDivisions,
            season_rule: SeasonRule::CalendarYear,
            ..
        }
    ));
}

#[test]
fn test_rendered_config_reloads() {
    let config = assert_ok!(Config::from_toml_str(EXAMPLE));
    let rendered = assert_ok!(render_config(&config));
    let reloaded = assert_ok!(Config::from_toml_str(&rendered));
    assert_eq!(reloaded.leagues, config.leagues);
    assert_eq!(reloaded.form.cache_path, config.form.cache_path);
}

#[test]
fn test_missing_api_key_is_fatal() {
    let config = assert_ok!(Config::from_toml_str(EXAMPLE));
    let err = assert_err!(config.api_key_from(|_| None));
    assert!(matches!(err, ConfigError::MissingApiKey(_)));
    assert!(err.to_string().contains("API_FOOTBALL_KEY"));
}

#[test]
fn test_config_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, EXAMPLE).unwrap();
    assert_ok!(Config::load(&path));

    std::fs::write(&path, "[[leagues]]\nwhatever = 1\n").unwrap();
    assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
}
