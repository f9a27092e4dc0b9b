//! Safest-market selection

use super::{RiskBucket, RiskThresholds};
use crate::config::MarketConfig;
use crate::form::TeamFormRecord;
use crate::model::Outcome;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Markets considered for every fixture, in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketKind {
    /// Home win or draw
    HomeOrDraw,
    /// Draw or away win
    DrawOrAway,
    Under,
    Over,
    /// Home win, stake returned on a draw
    DrawNoBetHome,
    /// Away win, stake returned on a draw
    DrawNoBetAway,
}

impl MarketKind {
    pub const ALL: [MarketKind; 6] = [
        MarketKind::HomeOrDraw,
        MarketKind::DrawOrAway,
        MarketKind::Under,
        MarketKind::Over,
        MarketKind::DrawNoBetHome,
        MarketKind::DrawNoBetAway,
    ];

    /// Display label; totals markets carry their line
    pub fn label(&self, line: f64) -> String {
        match self {
            MarketKind::HomeOrDraw => "1X".to_string(),
            MarketKind::DrawOrAway => "X2".to_string(),
            MarketKind::Under => format!("Under {}", line),
            MarketKind::Over => format!("Over {}", line),
            MarketKind::DrawNoBetHome => "DNB Home".to_string(),
            MarketKind::DrawNoBetAway => "DNB Away".to_string(),
        }
    }

    /// Side the market backs, if any
    pub fn side(&self) -> Option<FormBias> {
        match self {
            MarketKind::HomeOrDraw | MarketKind::DrawNoBetHome => Some(FormBias::Home),
            MarketKind::DrawOrAway | MarketKind::DrawNoBetAway => Some(FormBias::Away),
            MarketKind::Under | MarketKind::Over => None,
        }
    }
}

/// A market with its probabilities for one fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub kind: MarketKind,
    /// Probability the market wins outright
    pub raw_probability: f64,
    /// Probability the market loses; a void is not a loss
    pub loss_probability: f64,
}

impl Candidate {
    pub fn confidence(&self) -> f64 {
        1.0 - self.loss_probability
    }
}

/// All candidate markets for an outcome, in tie-break order
pub fn candidates(outcome: &Outcome) -> Vec<Candidate> {
    let o = outcome;
    MarketKind::ALL
        .iter()
        .map(|&kind| {
            let (raw, loss) = match kind {
                MarketKind::HomeOrDraw => (o.p_home_win + o.p_draw, o.p_away_win),
                MarketKind::DrawOrAway => (o.p_away_win + o.p_draw, o.p_home_win),
                MarketKind::Under => (o.p_under, 1.0 - o.p_under),
                MarketKind::Over => (o.p_over, 1.0 - o.p_over),
                MarketKind::DrawNoBetHome => (o.p_home_win, o.p_away_win),
                MarketKind::DrawNoBetAway => (o.p_away_win, o.p_home_win),
            };
            Candidate {
                kind,
                raw_probability: raw,
                loss_probability: loss,
            }
        })
        .collect()
}

/// The side in better recent form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormBias {
    Home,
    Away,
    Neutral,
}

impl FormBias {
    /// Compare form points (3 per win, 1 per draw)
    pub fn from_records(home: &TeamFormRecord, away: &TeamFormRecord) -> Self {
        match home.form_points().cmp(&away.form_points()) {
            Ordering::Greater => FormBias::Home,
            Ordering::Less => FormBias::Away,
            Ordering::Equal => FormBias::Neutral,
        }
    }
}

/// The suggestion made for a fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPick {
    /// Display label, e.g. "1X" or "Under 2.5"
    pub market: String,
    pub kind: MarketKind,
    pub win_probability: f64,
    pub loss_probability: f64,
    pub risk: RiskBucket,
    /// Highlight ordering score; plays no part in the pick itself
    pub score: f64,
}

impl MarketPick {
    pub fn confidence(&self) -> f64 {
        1.0 - self.loss_probability
    }
}

/// Picks one market per fixture
#[derive(Debug, Clone)]
pub struct MarketSelector {
    safety_threshold: f64,
    risk: RiskThresholds,
    form_bias_bonus: f64,
    compact_totals_bonus: f64,
}

impl MarketSelector {
    pub fn new(config: &MarketConfig) -> Self {
        Self {
            safety_threshold: config.safety_threshold,
            risk: config.risk,
            form_bias_bonus: config.form_bias_bonus,
            compact_totals_bonus: config.compact_totals_bonus,
        }
    }

    /// Best candidate for `outcome`
    ///
    /// Candidates at or above the safety threshold are preferred. Among the
    /// pool the lowest loss wins, then the highest raw probability, then
    /// candidate order.
    pub fn choose(&self, outcome: &Outcome) -> Candidate {
        let all = candidates(outcome);
        let safe: Vec<Candidate> = all
            .iter()
            .copied()
            .filter(|c| c.confidence() >= self.safety_threshold)
            .collect();
        let pool = if safe.is_empty() { &all } else { &safe };

        // Strictly better only, so the earliest of equal candidates stays
        let mut best = pool[0];
        for candidate in &pool[1..] {
            if compare(candidate, &best) == Ordering::Less {
                best = *candidate;
            }
        }
        best
    }

    /// Pick, risk bucket and ranking score for a fixture
    pub fn select(&self, outcome: &Outcome, bias: FormBias) -> MarketPick {
        let chosen = self.choose(outcome);
        let mut score = chosen.confidence();
        if chosen.kind.side() == Some(bias) {
            score += self.form_bias_bonus;
        }
        if chosen.kind == MarketKind::Under {
            score += self.compact_totals_bonus;
        }

        MarketPick {
            market: chosen.kind.label(outcome.line),
            kind: chosen.kind,
            win_probability: chosen.raw_probability,
            loss_probability: chosen.loss_probability,
            risk: self.risk.bucket(chosen.loss_probability),
            score,
        }
    }
}

fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    a.loss_probability
        .total_cmp(&b.loss_probability)
        .then_with(|| b.raw_probability.total_cmp(&a.raw_probability))
}
