//! Outcome model module
//!
//! Estimates 1X2 and totals probabilities for a fixture from both teams'
//! recent form using independent Poisson goal counts

mod poisson;

pub use poisson::{poisson_pmf, OutcomeModel};

use serde::{Deserialize, Serialize};

/// Model output for one fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Expected home goals
    pub lambda_home: f64,
    /// Expected away goals
    pub lambda_away: f64,
    pub p_home_win: f64,
    pub p_draw: f64,
    pub p_away_win: f64,
    /// Totals line the under/over split refers to
    pub line: f64,
    pub p_under: f64,
    pub p_over: f64,
    /// Grid carried no usable mass and the neutral outcome was substituted
    pub degenerate: bool,
}

impl Outcome {
    /// Uniform 1X2 with an even totals split
    pub fn neutral(lambda_home: f64, lambda_away: f64, line: f64) -> Self {
        Self {
            lambda_home,
            lambda_away,
            p_home_win: 1.0 / 3.0,
            p_draw: 1.0 / 3.0,
            p_away_win: 1.0 / 3.0,
            line,
            p_under: 0.5,
            p_over: 0.5,
            degenerate: true,
        }
    }
}
