//! Risk buckets over loss probability

use serde::{Deserialize, Serialize};

/// Coarse risk label of a pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskBucket::Low => "low",
            RiskBucket::Medium => "medium",
            RiskBucket::High => "high",
        };
        f.write_str(s)
    }
}

/// Upper bounds (inclusive) of the low and medium buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub low_max: f64,
    pub medium_max: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_max: 0.30,
            medium_max: 0.45,
        }
    }
}

impl RiskThresholds {
    /// Requires `0 <= low_max <= medium_max <= 1`
    pub fn validate(&self) -> Result<(), String> {
        if (0.0..=1.0).contains(&self.low_max)
            && (0.0..=1.0).contains(&self.medium_max)
            && self.low_max <= self.medium_max
        {
            Ok(())
        } else {
            Err(format!(
                "risk thresholds must satisfy 0 <= low_max ({}) <= medium_max ({}) <= 1",
                self.low_max, self.medium_max
            ))
        }
    }

    /// Bucket for a loss probability
    ///
    /// Values outside [0, 1] are clamped; NaN is high.
    pub fn bucket(&self, loss: f64) -> RiskBucket {
        if loss.is_nan() {
            return RiskBucket::High;
        }
        let loss = loss.clamp(0.0, 1.0);
        if loss <= self.low_max {
            RiskBucket::Low
        } else if loss <= self.medium_max {
            RiskBucket::Medium
        } else {
            RiskBucket::High
        }
    }
}
