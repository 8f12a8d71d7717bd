//! Scoring & gap-analysis engine
//!
//! Leaves first: `parameters` holds the 16 pure scoring primitives,
//! `critical` the Big-5 metrics, `tiers` the weighted tier model.
//! `engine` aggregates them into a `ComprehensiveScore` and `gaps`
//! turns scores into prioritized remediation.

pub mod critical;
pub mod engine;
pub mod gaps;
pub mod parameters;
pub mod tiers;

pub use critical::{CriticalMetric, CriticalMetricScore};
pub use engine::{ComprehensiveScore, MatchQuality, ScoringEngine};
pub use gaps::{Big5Gap, GapAnalysisResult, GapPriority, Improvement, TierGap};
pub use parameters::{ParameterScore, ScoreParameter, ScoringInput};
pub use tiers::{Tier, TierScore};
