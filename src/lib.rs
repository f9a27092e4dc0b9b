//! matchday-radar: ranked, explainable market suggestions for upcoming
//! football fixtures
//!
//! This library provides the core components for:
//! - Throttled, retrying access to the football statistics provider
//! - League resolution from ids, fuzzy searches and regional expansion
//! - Upcoming fixture fetching with season-label fallback
//! - Team form aggregation with a TTL file cache
//! - Poisson outcome model and safest-market selection
//! - Calendar and highlight snapshot documents
//! - Structured logging and run metrics

pub mod cli;
pub mod config;
pub mod fixtures;
pub mod form;
pub mod league;
pub mod market;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod snapshot;
pub mod telemetry;
