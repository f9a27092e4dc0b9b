//! Independent-Poisson scoreline model

use super::Outcome;
use crate::config::ModelConfig;
use crate::form::TeamFormRecord;
use crate::telemetry::{increment, CounterMetric};

/// Retained 1X2 mass below this is treated as no information
const DEGENERATE_MASS: f64 = 1e-9;

/// Deviation from 1 tolerated before renormalizing
const RENORMALIZE_TOLERANCE: f64 = 1e-9;

/// P(X = k) for k in `0..=max_goals`, by recurrence
///
/// Mass beyond `max_goals` is dropped, so the sum is at most 1.
pub fn poisson_pmf(lambda: f64, max_goals: u32) -> Vec<f64> {
    let max_k = max_goals as usize;
    let mut out = vec![0.0; max_k + 1];
    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

/// Turns two teams' recent form into outcome probabilities
#[derive(Debug, Clone)]
pub struct OutcomeModel {
    config: ModelConfig,
}

impl OutcomeModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Expected goals for the home and away side
    ///
    /// Each side's rate is the mean of its attack and the opponent's defence,
    /// clamped, then scaled for venue. Teams without history count at the
    /// neutral rate.
    pub fn expected_goals(&self, home: &TeamFormRecord, away: &TeamFormRecord) -> (f64, f64) {
        let c = &self.config;
        let neutral = c.neutral_goal_rate;
        let home_attack = home.attack_rate().unwrap_or(neutral);
        let home_defence = home.defence_rate().unwrap_or(neutral);
        let away_attack = away.attack_rate().unwrap_or(neutral);
        let away_defence = away.defence_rate().unwrap_or(neutral);

        let lambda_home = self.clamp((home_attack + away_defence) / 2.0) * c.home_advantage;
        let lambda_away = self.clamp((away_attack + home_defence) / 2.0) * c.away_dampening;
        (lambda_home, lambda_away)
    }

    /// Outcome for a fixture between `home` and `away`
    pub fn evaluate(&self, home: &TeamFormRecord, away: &TeamFormRecord) -> Outcome {
        let (lambda_home, lambda_away) = self.expected_goals(home, away);
        let outcome = self.from_lambdas(lambda_home, lambda_away);
        if outcome.degenerate {
            increment(CounterMetric::ModelDegenerate);
            tracing::warn!(
                home_team = home.team_id,
                away_team = away.team_id,
                lambda_home,
                lambda_away,
                "Degenerate scoreline grid, using neutral outcome"
            );
        }
        outcome
    }

    /// Outcome for explicit expectancies
    pub fn from_lambdas(&self, lambda_home: f64, lambda_away: f64) -> Outcome {
        let line = self.config.goal_line;
        let pmf_home = poisson_pmf(lambda_home, self.config.max_goals);
        let pmf_away = poisson_pmf(lambda_away, self.config.max_goals);

        let mut p_home = 0.0;
        let mut p_draw = 0.0;
        let mut p_away = 0.0;
        let mut p_under = 0.0;
        for (i, p_i) in pmf_home.iter().enumerate() {
            for (j, p_j) in pmf_away.iter().enumerate() {
                let p = p_i * p_j;
                match i.cmp(&j) {
                    std::cmp::Ordering::Greater => p_home += p,
                    std::cmp::Ordering::Equal => p_draw += p,
                    std::cmp::Ordering::Less => p_away += p,
                }
                if ((i + j) as f64) < line {
                    p_under += p;
                }
            }
        }

        let mass = p_home + p_draw + p_away;
        if !mass.is_finite() || mass < DEGENERATE_MASS {
            return Outcome::neutral(lambda_home, lambda_away, line);
        }

        // Under and over split the same retained grid as 1X2
        let mut p_over = mass - p_under;
        if (mass - 1.0).abs() > RENORMALIZE_TOLERANCE {
            p_home /= mass;
            p_draw /= mass;
            p_away /= mass;
            p_under /= mass;
            p_over /= mass;
        }

        Outcome {
            lambda_home,
            lambda_away,
            p_home_win: p_home,
            p_draw,
            p_away_win: p_away,
            line,
            p_under,
            p_over,
            degenerate: false,
        }
    }

    fn clamp(&self, rate: f64) -> f64 {
        rate.max(self.config.lambda_min).min(self.config.lambda_max)
    }
}
