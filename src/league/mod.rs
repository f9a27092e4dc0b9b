//! League resolution
//!
//! Turns configured league specs (explicit id, fuzzy search, country-wide
//! expansion) into concrete leagues with a season rule.

mod resolver;
mod scoring;
mod season;

pub use resolver::{LeagueResolver, ResolveError};
pub use scoring::{
    rank_candidates, regional_top_division, score_candidate, select_regional_divisions,
    LeagueCandidate, ScoreWeights, ScoredCandidate, SearchQuery,
};
pub use season::{SeasonRule, SPLIT_SEASON_START_MONTH};

use serde::{Deserialize, Serialize};

/// Country-wide expansion rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionRule {
    /// Top division of every state/regional championship of a country
    StateTopDivisions,
}

/// A configured league entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeagueSpec {
    /// Provider league id, used as is
    Id {
        id: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        country: Option<String>,
        #[serde(default)]
        season_rule: SeasonRule,
    },
    /// Search by name, optionally narrowed by country and type
    Search {
        search: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        country: Option<String>,
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default)]
        season_rule: SeasonRule,
    },
    /// Expand to every league of a country matching a rule
    Expand {
        expand: ExpansionRule,
        country: String,
        #[serde(default)]
        season_rule: SeasonRule,
    },
}

impl LeagueSpec {
    /// Season rule of the spec
    pub fn season_rule(&self) -> SeasonRule {
        match self {
            LeagueSpec::Id { season_rule, .. }
            | LeagueSpec::Search { season_rule, .. }
            | LeagueSpec::Expand { season_rule, .. } => *season_rule,
        }
    }

    /// Short human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            LeagueSpec::Id { id, .. } => format!("id {}", id),
            LeagueSpec::Search {
                search, country, ..
            } => match country {
                Some(c) => format!("search '{}' ({})", search, c),
                None => format!("search '{}'", search),
            },
            LeagueSpec::Expand {
                expand, country, ..
            } => format!("expand {:?} ({})", expand, country),
        }
    }

    /// Structural checks done at config load
    pub fn validate(&self) -> Result<(), String> {
        match self {
            LeagueSpec::Id { id, .. } if *id == 0 => Err("league id must be non-zero".to_string()),
            LeagueSpec::Search { search, .. } if search.trim().is_empty() => {
                Err("league search query must not be empty".to_string())
            }
            LeagueSpec::Expand { country, .. } if country.trim().is_empty() => {
                Err("league expansion needs a country".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// A league ready for fixture fetching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLeague {
    pub id: u32,
    pub name: String,
    pub country: String,
    pub season_rule: SeasonRule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_describe() {
        let spec = LeagueSpec::Search {
            search: "Eredivisie".to_string(),
            country: Some("Netherlands".to_string()),
            kind: None,
            season_rule: SeasonRule::SplitYear,
        };
        assert_eq!(spec.describe(), "search 'Eredivisie' (Netherlands)");
        assert_eq!(spec.season_rule(), SeasonRule::SplitYear);
    }

    #[test]
    fn test_spec_validate() {
        let blank = LeagueSpec::Search {
            search: "  ".to_string(),
            country: None,
            kind: None,
            season_rule: SeasonRule::default(),
        };
        assert!(blank.validate().is_err());

        let zero = LeagueSpec::Id {
            id: 0,
            name: None,
            country: None,
            season_rule: SeasonRule::default(),
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_untagged_spec_json() {
        let spec: LeagueSpec =
            serde_json::from_str(r#"{"expand":"state_top_divisions","country":"Brazil"}"#).unwrap();
        assert_eq!(
            spec,
            LeagueSpec::Expand {
                expand: ExpansionRule::StateTopDivisions,
                country: "Brazil".to_string(),
                season_rule: SeasonRule::SplitYear,
            }
        );
    }
}
