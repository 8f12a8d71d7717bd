//! The "Big 5" critical metrics
//!
//! Five high-leverage sub-scores weighted more heavily than an equivalent
//! tier point in remediation prioritization. Each is a rescaled view of a
//! scoring primitive onto a common 0..20 scale so percentages read
//! uniformly.

use crate::scoring::parameters::{ParameterScore, ScoreParameter};
use serde::{Deserialize, Serialize};

pub const CRITICAL_METRIC_MAX: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalMetric {
    JdKeywordMatch,
    TechnicalSkillsAlignment,
    QuantifiedResults,
    JobTitleRelevance,
    ExperienceRelevance,
}

impl CriticalMetric {
    pub const ALL: [CriticalMetric; 5] = [
        CriticalMetric::JdKeywordMatch,
        CriticalMetric::TechnicalSkillsAlignment,
        CriticalMetric::QuantifiedResults,
        CriticalMetric::JobTitleRelevance,
        CriticalMetric::ExperienceRelevance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CriticalMetric::JdKeywordMatch => "jd_keyword_match",
            CriticalMetric::TechnicalSkillsAlignment => "technical_skills_alignment",
            CriticalMetric::QuantifiedResults => "quantified_results",
            CriticalMetric::JobTitleRelevance => "job_title_relevance",
            CriticalMetric::ExperienceRelevance => "experience_relevance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CriticalMetric::JdKeywordMatch => "JD Keyword Match",
            CriticalMetric::TechnicalSkillsAlignment => "Technical Skills Alignment",
            CriticalMetric::QuantifiedResults => "Quantified Results",
            CriticalMetric::JobTitleRelevance => "Job Title Relevance",
            CriticalMetric::ExperienceRelevance => "Experience Relevance",
        }
    }

    /// The primitive this metric is a rescaled view of.
    pub fn source_parameter(&self) -> ScoreParameter {
        match self {
            CriticalMetric::JdKeywordMatch => ScoreParameter::KeywordMatch,
            CriticalMetric::TechnicalSkillsAlignment => ScoreParameter::SkillsAlignment,
            CriticalMetric::QuantifiedResults => ScoreParameter::QuantifiedAchievements,
            CriticalMetric::JobTitleRelevance => ScoreParameter::JobTitleMatch,
            CriticalMetric::ExperienceRelevance => ScoreParameter::ExperienceRelevance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalMetricScore {
    pub metric: CriticalMetric,
    pub score: u32,
    pub max: u32,
    pub percentage: f32,
}

/// Compute all five critical metrics from the already-scored parameters.
pub fn compute_critical_metrics(parameters: &[ParameterScore]) -> Vec<CriticalMetricScore> {
    CriticalMetric::ALL
        .iter()
        .map(|metric| {
            let source = metric.source_parameter();
            let param = parameters
                .iter()
                .find(|p| p.parameter == source)
                .expect("all 16 parameters are always scored");
            let fraction = if param.max == 0 {
                0.0
            } else {
                param.score as f32 / param.max as f32
            };
            let score = (fraction * CRITICAL_METRIC_MAX as f32).round() as u32;
            CriticalMetricScore {
                metric: *metric,
                score,
                max: CRITICAL_METRIC_MAX,
                percentage: fraction * 100.0,
            }
        })
        .collect()
}
