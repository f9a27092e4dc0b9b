//! Market selection module
//!
//! Turns an outcome into one suggested market per fixture with its risk
//! bucket and highlight ranking score

mod risk;
mod selector;

pub use risk::{RiskBucket, RiskThresholds};
pub use selector::{candidates, Candidate, FormBias, MarketKind, MarketPick, MarketSelector};
