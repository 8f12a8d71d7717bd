//! Scoring engine: aggregates primitives, tiers and critical metrics
//! into a `ComprehensiveScore`

use crate::config::ScoringConfig;
use crate::model::job::JobProfile;
use crate::model::resume::ResumeSnapshot;
use crate::scoring::critical::{compute_critical_metrics, CriticalMetricScore};
use crate::scoring::parameters::{self, ParameterScore, ScoringInput};
use crate::scoring::tiers::{evaluate_tiers, TierScore};
use log::debug;
use serde::{Deserialize, Serialize};

/// Full scoring result for one `(resume, job description)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveScore {
    /// Tier-weighted overall score, 0..=100.
    pub overall_score: u32,
    /// Sum of the 16 parameter scores, clamped at 100 (the flat ATS view).
    pub ats_score: u32,
    pub parameters: Vec<ParameterScore>,
    pub tiers: Vec<TierScore>,
    pub critical_metrics: Vec<CriticalMetricScore>,
    pub fresher: bool,
    pub jd_mode: bool,
    pub match_quality: MatchQuality,
    pub interview_chance: String,
}

/// Qualitative label for an overall score. Presentation only: nothing
/// downstream computes from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchQuality {
    Excellent,
    Strong,
    Good,
    Fair,
    Weak,
    Inadequate,
}

impl MatchQuality {
    pub fn from_score(score: u32) -> Self {
        match score {
            85..=100 => MatchQuality::Excellent,
            70..=84 => MatchQuality::Strong,
            55..=69 => MatchQuality::Good,
            45..=54 => MatchQuality::Fair,
            35..=44 => MatchQuality::Weak,
            _ => MatchQuality::Inadequate,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchQuality::Excellent => "Excellent",
            MatchQuality::Strong => "Strong",
            MatchQuality::Good => "Good",
            MatchQuality::Fair => "Fair",
            MatchQuality::Weak => "Weak",
            MatchQuality::Inadequate => "Inadequate",
        }
    }
}

/// Estimated shortlist-probability bucket for an overall score.
pub fn interview_chance(score: u32) -> &'static str {
    match score {
        85..=100 => "90%+",
        70..=84 => "60-75%",
        55..=69 => "30-50%",
        45..=54 => "10-25%",
        35..=44 => "3-8%",
        _ => "1-2%",
    }
}

pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Run the full scoring model. Deterministic: identical inputs yield
    /// bit-identical results.
    pub fn calculate_score(
        &self,
        resume_text: &str,
        resume: Option<&ResumeSnapshot>,
        job_description: Option<&str>,
    ) -> ComprehensiveScore {
        let profile = job_description
            .filter(|jd| jd.chars().count() >= self.config.jd_min_chars)
            .map(|jd| JobProfile::extract(jd, &self.config));

        self.calculate_with_profile(resume_text, resume, profile.as_ref())
    }

    /// Variant that reuses an already-extracted job profile; the pipeline
    /// extracts once per session and scores many resume versions.
    pub fn calculate_with_profile(
        &self,
        resume_text: &str,
        resume: Option<&ResumeSnapshot>,
        profile: Option<&JobProfile>,
    ) -> ComprehensiveScore {
        let input = ScoringInput {
            resume_text,
            resume,
            job: profile,
            config: &self.config,
        };

        let fresher = profile.map(|p| p.is_fresher()).unwrap_or(false);
        let jd_mode = input.jd_mode();

        let parameter_scores = parameters::score_all(&input);
        let tier_scores = evaluate_tiers(&parameter_scores, &input, fresher);
        let critical_metrics = compute_critical_metrics(&parameter_scores);

        let ats_total: u32 = parameter_scores.iter().map(|p| p.score).sum();
        let ats_score = ats_total.min(100);

        let weighted: f32 = tier_scores.iter().map(|t| t.score).sum();
        let overall_score = (weighted.round() as u32).min(100);

        debug!(
            "scored resume: overall={} ats={} jd_mode={} fresher={}",
            overall_score, ats_score, jd_mode, fresher
        );

        let match_quality = MatchQuality::from_score(overall_score);
        let chance = interview_chance(overall_score).to_string();

        ComprehensiveScore {
            overall_score,
            ats_score,
            parameters: parameter_scores,
            tiers: tier_scores,
            critical_metrics,
            fresher,
            jd_mode,
            match_quality,
            interview_chance: chance,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::resume::{ContactInfo, Education, SkillGroup};
    use crate::scoring::tiers::Tier;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(Config::default().scoring)
    }

    fn education_only_resume() -> ResumeSnapshot {
        let mut snapshot = ResumeSnapshot::empty();
        snapshot.contact = ContactInfo {
            name: Some("Priya Patel".to_string()),
            email: Some("priya@example.com".to_string()),
            phone: Some("555-0199".to_string()),
            location: None,
            links: vec![],
        };
        snapshot.summary =
            Some("Recent computer science graduate with strong python fundamentals".to_string());
        snapshot.education = vec![Education {
            degree: "Bachelor of Technology in Computer Science".to_string(),
            institution: "National Institute".to_string(),
            year: Some("2025".to_string()),
        }];
        snapshot.skills = vec![SkillGroup {
            category: "Technical".to_string(),
            items: vec!["Python".to_string(), "SQL".to_string(), "Git".to_string()],
        }];
        snapshot
    }

    #[test]
    fn test_determinism_three_runs() {
        let engine = engine();
        let resume = education_only_resume();
        let text = resume.to_text();
        let jd = "Entry-level python developer. SQL knowledge required. Git familiarity a plus.";

        let a = engine.calculate_score(&text, Some(&resume), Some(jd));
        let b = engine.calculate_score(&text, Some(&resume), Some(jd));
        let c = engine.calculate_score(&text, Some(&resume), Some(jd));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_fresher_scenario_experience_not_penalized() {
        let engine = engine();
        let resume = education_only_resume();
        let text = resume.to_text();
        let jd = "Entry-level, 0-1 years, freshers welcome. Python and SQL development role \
                  for recent graduates joining our platform team.";

        let score = engine.calculate_score(&text, Some(&resume), Some(jd));
        assert!(score.fresher);

        let experience = score
            .tiers
            .iter()
            .find(|t| t.tier == Tier::Experience)
            .unwrap();
        assert_eq!(experience.weight, 8);
        assert!(
            experience.percentage >= 70.0,
            "experience percentage was {}",
            experience.percentage
        );
    }

    #[test]
    fn test_short_jd_falls_back_to_general_mode() {
        let engine = engine();
        let resume = education_only_resume();
        let text = resume.to_text();
        let score = engine.calculate_score(&text, Some(&resume), Some("python dev"));
        assert!(!score.jd_mode);
    }

    #[test]
    fn test_overall_within_bounds() {
        let engine = engine();
        let resume = education_only_resume();
        let text = resume.to_text();
        let score = engine.calculate_score(&text, Some(&resume), None);
        assert!(score.overall_score <= 100);
        assert!(score.ats_score <= 100);
        let param_sum: u32 = score.parameters.iter().map(|p| p.score).sum();
        assert_eq!(score.ats_score, param_sum.min(100));
    }

    #[test]
    fn test_match_quality_ladder() {
        assert_eq!(MatchQuality::from_score(92), MatchQuality::Excellent);
        assert_eq!(interview_chance(92), "90%+");
        assert_eq!(MatchQuality::from_score(30), MatchQuality::Inadequate);
        assert_eq!(interview_chance(30), "1-2%");
        assert_eq!(MatchQuality::from_score(85), MatchQuality::Excellent);
        assert_eq!(MatchQuality::from_score(84), MatchQuality::Strong);
    }
}
