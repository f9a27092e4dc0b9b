//! Configuration types for matchday-radar

use crate::league::LeagueSpec;
use crate::market::RiskThresholds;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors; all of them abort the run before any network call
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid TOML or a league spec has no known shape
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// API key environment variable unset or blank
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),
    /// Values that parse but make no sense together
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Leagues to cover
    pub leagues: Vec<LeagueSpec>,
}

/// Provider access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Minimum spacing between requests (milliseconds)
    pub min_interval_ms: u64,
    /// Extra attempts after the first one
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub timeout_secs: u64,
    /// Worker count for league, fixture and form fetches
    pub concurrency: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://v3.football.api-sports.io".to_string(),
            api_key_env: "API_FOOTBALL_KEY".to_string(),
            min_interval_ms: 250,
            max_retries: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
            timeout_secs: 15,
            concurrency: 4,
        }
    }
}

/// Fixture window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Days covered, today included
    pub days_ahead: u32,
    /// Fixture cap per league
    pub max_per_league: usize,
    /// Fixture cap across all leagues
    pub max_total: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            days_ahead: 7,
            max_per_league: 40,
            max_total: 250,
        }
    }
}

/// Team form configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Number of recent finished matches per team (N)
    pub window: usize,
    /// Cache entries older than this are refreshed
    pub ttl_hours: i64,
    /// Cache file; no file cache when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            window: 5,
            ttl_hours: 20,
            cache_path: Some(PathBuf::from("cache/team_form.json")),
        }
    }
}

/// Poisson outcome model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Largest goal count in the scoreline grid
    pub max_goals: u32,
    /// Goals per match assumed when a team has no usable history
    pub neutral_goal_rate: f64,
    /// Multiplier (> 1) applied to the home side's expectancy
    pub home_advantage: f64,
    /// Multiplier (< 1) applied to the away side's expectancy
    pub away_dampening: f64,
    pub lambda_min: f64,
    pub lambda_max: f64,
    /// Totals line for Under/Over
    pub goal_line: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_goals: 10,
            neutral_goal_rate: 1.35,
            home_advantage: 1.10,
            away_dampening: 0.95,
            lambda_min: 0.2,
            lambda_max: 3.5,
            goal_line: 2.5,
        }
    }
}

/// Market selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Minimum confidence (1 - loss) for a candidate to be preferred
    pub safety_threshold: f64,
    pub risk: RiskThresholds,
    /// Ranking bonus for markets backing the side in better form
    pub form_bias_bonus: f64,
    /// Ranking bonus for Under markets
    pub compact_totals_bonus: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            safety_threshold: 0.60,
            risk: RiskThresholds::default(),
            form_bias_bonus: 0.03,
            compact_totals_bonus: 0.02,
        }
    }
}

/// Highlight selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Rolling horizon for the daily highlights
    pub day_horizon_hours: i64,
    pub daily_limit: usize,
    pub weekly_limit: usize,
    /// Maximum weekly entries from one competition
    pub per_competition_cap: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            day_horizon_hours: 24,
            daily_limit: 3,
            weekly_limit: 10,
            per_competition_cap: 3,
        }
    }
}

/// Output location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

const MAX_DAYS_AHEAD: u32 = 60;
const MAX_TTL_HOURS: i64 = 24 * 365;
const MAX_GOALS_LIMIT: u32 = 30;
const MAX_DAY_HORIZON_HOURS: i64 = 24 * 31;

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leagues.is_empty() {
            return Err(ConfigError::Invalid("no leagues configured".to_string()));
        }
        for spec in &self.leagues {
            spec.validate().map_err(ConfigError::Invalid)?;
        }
        if !(1..=MAX_DAYS_AHEAD).contains(&self.window.days_ahead) {
            return Err(ConfigError::Invalid(format!(
                "window.days_ahead must be within [1, {}]",
                MAX_DAYS_AHEAD
            )));
        }
        if self.form.window == 0 {
            return Err(ConfigError::Invalid("form.window must be >= 1".to_string()));
        }
        if !(0..=MAX_TTL_HOURS).contains(&self.form.ttl_hours) {
            return Err(ConfigError::Invalid(format!(
                "form.ttl_hours must be within [0, {}]",
                MAX_TTL_HOURS
            )));
        }
        if self.provider.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "provider.concurrency must be >= 1".to_string(),
            ));
        }
        let m = &self.model;
        if !(1..=MAX_GOALS_LIMIT).contains(&m.max_goals) {
            return Err(ConfigError::Invalid(format!(
                "model.max_goals must be within [1, {}]",
                MAX_GOALS_LIMIT
            )));
        }
        if !(m.lambda_min > 0.0 && m.lambda_min <= m.lambda_max) {
            return Err(ConfigError::Invalid(
                "model.lambda_min must be > 0 and <= model.lambda_max".to_string(),
            ));
        }
        if m.home_advantage < 1.0 || m.away_dampening > 1.0 || m.away_dampening <= 0.0 {
            return Err(ConfigError::Invalid(
                "model.home_advantage must be >= 1 and model.away_dampening in (0, 1]".to_string(),
            ));
        }
        if !(m.neutral_goal_rate > 0.0) || !(m.goal_line > 0.0) {
            return Err(ConfigError::Invalid(
                "model.neutral_goal_rate and model.goal_line must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.market.safety_threshold) {
            return Err(ConfigError::Invalid(
                "market.safety_threshold must be within [0, 1]".to_string(),
            ));
        }
        self.market.risk.validate().map_err(ConfigError::Invalid)?;
        if !(1..=MAX_DAY_HORIZON_HOURS).contains(&self.snapshot.day_horizon_hours) {
            return Err(ConfigError::Invalid(format!(
                "snapshot.day_horizon_hours must be within [1, {}]",
                MAX_DAY_HORIZON_HOURS
            )));
        }
        Ok(())
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    /// Read the API key through `lookup`
    pub fn api_key_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        let name = &self.provider.api_key_env;
        match lookup(name) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ConfigError::MissingApiKey(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::{ExpansionRule, SeasonRule};

    const MINIMAL: &str = r#"
        [[leagues]]
        id = 39
        season_rule = "split_year"
    "#;

    #[test]
    fn test_config_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.window.days_ahead, 7);
        assert_eq!(config.form.window, 5);
        assert_eq!(config.form.ttl_hours, 20);
        assert_eq!(config.model.max_goals, 10);
        assert_eq!(config.snapshot.weekly_limit, 10);
        assert_eq!(config.provider.api_key_env, "API_FOOTBALL_KEY");
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_deserialize_all_league_shapes() {
        let toml = r#"
            [provider]
            min_interval_ms = 1000
            concurrency = 2

            [form]
            window = 6
            ttl_hours = 12

            [market]
            safety_threshold = 0.65

            [market.risk]
            low_max = 0.25
            medium_max = 0.40

            [telemetry]
            log_level = "debug"
            log_format = "json"

            [[leagues]]
            id = 39

            [[leagues]]
            search = "Serie A"
            country = "Italy"
            type = "league"

            [[leagues]]
            expand = "state_top_divisions"
            country = "Brazil"
            season_rule = "calendar_year"
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.provider.min_interval_ms, 1000);
        assert_eq!(config.form.window, 6);
        assert_eq!(config.market.risk.low_max, 0.25);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.leagues.len(), 3);
        assert!(matches!(config.leagues[0], LeagueSpec::Id { id: 39, .. }));
        assert!(matches!(
            &config.leagues[1],
            LeagueSpec::Search { search, kind: Some(k), .. } if search == "Serie A" && k == "league"
        ));
        assert!(matches!(
            &config.leagues[2],
            LeagueSpec::Expand {
                expand: ExpansionRule::StateTopDivisions,
                season_rule: SeasonRule::CalendarYear,
                ..
            }
        ));
    }

    #[test]
    fn test_unparsable_league_spec_is_error() {
        let toml = r#"
            [[leagues]]
            nickname = "the prem"
        "#;
        assert!(matches!(
            Config::from_toml_str(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_league_list_is_invalid() {
        assert!(matches!(
            Config::from_toml_str("leagues = []"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_risk_thresholds_out_of_order_are_invalid() {
        let toml = format!(
            "{}\n[market.risk]\nlow_max = 0.5\nmedium_max = 0.4\n",
            MINIMAL
        );
        assert!(matches!(
            Config::from_toml_str(&toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_out_of_range_bounds_are_invalid() {
        for section in [
            "[model]\nmax_goals = 4294967295\n",
            "[model]\nmax_goals = 0\n",
            "[snapshot]\nday_horizon_hours = 9223372036854775807\n",
            "[snapshot]\nday_horizon_hours = 0\n",
            "[form]\nttl_hours = 9223372036854775807\n",
            "[window]\ndays_ahead = 100000\n",
        ] {
            let toml = format!("{}{}", section, MINIMAL);
            assert!(
                matches!(Config::from_toml_str(&toml), Err(ConfigError::Invalid(_))),
                "accepted {}",
                section
            );
        }
    }

    #[test]
    fn test_zero_form_window_is_invalid() {
        let toml = format!("[form]\nwindow = 0\n{}", MINIMAL);
        assert!(matches!(
            Config::from_toml_str(&toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_api_key_lookup() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        let key = config
            .api_key_from(|name| (name == "API_FOOTBALL_KEY").then(|| " abc ".to_string()))
            .unwrap();
        assert_eq!(key, "abc");

        let missing = config.api_key_from(|_| None);
        assert!(matches!(missing, Err(ConfigError::MissingApiKey(ref n)) if n == "API_FOOTBALL_KEY"));

        let blank = config.api_key_from(|_| Some("   ".to_string()));
        assert!(blank.is_err());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_serializes_back_to_toml() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let reparsed = Config::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed.leagues, config.leagues);
    }
}
