//! Tier model: ten weighted scoring categories
//!
//! Tier weights are percentages of the overall score and sum to exactly
//! 100 for every role classification. Entry-level ("fresher") postings
//! redistribute weight away from experience toward skills, education and
//! projects, because an early-career candidate cannot be penalized for a
//! tier they structurally cannot fill.

use crate::model::resume::SectionId;
use crate::scoring::parameters::{ParameterScore, ScoreParameter, ScoringInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Structure,
    Content,
    Experience,
    Education,
    Certifications,
    SkillsKeywords,
    Projects,
    RedFlags,
    CompetitiveSignals,
    CultureFit,
}

impl Tier {
    pub const ALL: [Tier; 10] = [
        Tier::Structure,
        Tier::Content,
        Tier::Experience,
        Tier::Education,
        Tier::Certifications,
        Tier::SkillsKeywords,
        Tier::Projects,
        Tier::RedFlags,
        Tier::CompetitiveSignals,
        Tier::CultureFit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Structure => "structure",
            Tier::Content => "content",
            Tier::Experience => "experience",
            Tier::Education => "education",
            Tier::Certifications => "certifications",
            Tier::SkillsKeywords => "skills_keywords",
            Tier::Projects => "projects",
            Tier::RedFlags => "red_flags",
            Tier::CompetitiveSignals => "competitive_signals",
            Tier::CultureFit => "culture_fit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Structure => "Structure",
            Tier::Content => "Content",
            Tier::Experience => "Experience",
            Tier::Education => "Education",
            Tier::Certifications => "Certifications",
            Tier::SkillsKeywords => "Skills & Keywords",
            Tier::Projects => "Projects",
            Tier::RedFlags => "Red Flags",
            Tier::CompetitiveSignals => "Competitive Signals",
            Tier::CultureFit => "Culture Fit",
        }
    }

    /// Weight in percent of the overall score. Standard weights carry
    /// experience 25 / skills 25 / education 6; fresher postings shift to
    /// experience 8 / skills 28 / education 15, with projects absorbing
    /// the remaining 5 points so the sum stays exactly 100.
    pub fn weight(&self, fresher: bool) -> u32 {
        match (self, fresher) {
            (Tier::Structure, _) => 8,
            (Tier::Content, _) => 10,
            (Tier::Experience, false) => 25,
            (Tier::Experience, true) => 8,
            (Tier::Education, false) => 6,
            (Tier::Education, true) => 15,
            (Tier::Certifications, _) => 4,
            (Tier::SkillsKeywords, false) => 25,
            (Tier::SkillsKeywords, true) => 28,
            (Tier::Projects, false) => 8,
            (Tier::Projects, true) => 13,
            (Tier::RedFlags, _) => 5,
            (Tier::CompetitiveSignals, _) => 4,
            (Tier::CultureFit, _) => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierScore {
    pub tier: Tier,
    /// Weighted points earned, in [0, weight].
    pub score: f32,
    /// Maximum points, equal to the tier weight.
    pub max: f32,
    pub weight: u32,
    pub percentage: f32,
    /// Ordered, human-readable deficiencies, worst first.
    pub top_issues: Vec<String>,
}

fn param_fraction(parameters: &[ParameterScore], parameter: ScoreParameter) -> f32 {
    parameters
        .iter()
        .find(|p| p.parameter == parameter)
        .map(|p| {
            if p.max == 0 {
                0.0
            } else {
                p.score as f32 / p.max as f32
            }
        })
        .unwrap_or(0.0)
}

/// Evaluate all ten tiers from the scored parameters plus direct resume
/// inspection for the tiers the parameters do not fully cover.
pub fn evaluate_tiers(
    parameters: &[ParameterScore],
    input: &ScoringInput<'_>,
    fresher: bool,
) -> Vec<TierScore> {
    Tier::ALL
        .iter()
        .map(|tier| evaluate_tier(*tier, parameters, input, fresher))
        .collect()
}

fn evaluate_tier(
    tier: Tier,
    parameters: &[ParameterScore],
    input: &ScoringInput<'_>,
    fresher: bool,
) -> TierScore {
    let frac = |p| param_fraction(parameters, p);
    let mut issues: Vec<String> = Vec::new();

    let percentage_fraction: f32 = match tier {
        Tier::Structure => {
            let completeness = frac(ScoreParameter::SectionCompleteness);
            let formatting = frac(ScoreParameter::FormattingConsistency);
            let contact = frac(ScoreParameter::ContactInfo);
            let length = frac(ScoreParameter::ResumeLength);
            if completeness < 0.7 {
                issues.push("Key resume sections are missing".to_string());
            }
            if contact < 1.0 {
                issues.push("Contact information is incomplete".to_string());
            }
            if length < 0.6 {
                issues.push("Resume length is outside the recommended band".to_string());
            }
            completeness * 0.4 + formatting * 0.2 + contact * 0.2 + length * 0.2
        }
        Tier::Content => {
            let verbs = frac(ScoreParameter::ActionVerbs);
            let quantified = frac(ScoreParameter::QuantifiedAchievements);
            let summary = frac(ScoreParameter::SummaryQuality);
            let variety = frac(ScoreParameter::WordVariety);
            if verbs < 0.5 {
                issues.push("Bullets rarely open with strong action verbs".to_string());
            }
            if quantified < 0.5 {
                issues.push("Few bullets carry measurable results".to_string());
            }
            if summary < 0.5 {
                issues.push("Summary is missing or not tailored to the role".to_string());
            }
            verbs * 0.3 + quantified * 0.35 + summary * 0.2 + variety * 0.15
        }
        Tier::Experience => {
            let relevance = frac(ScoreParameter::ExperienceRelevance);
            let title = frac(ScoreParameter::JobTitleMatch);
            let has_experience = input
                .resume
                .map(|r| !r.experience.is_empty())
                .unwrap_or(false);
            let computed = relevance * 0.7 + title * 0.3;
            if fresher && !has_experience {
                // Entry-level posting and structurally absent tier: floor,
                // do not penalize
                computed.max(0.75)
            } else {
                if relevance < 0.5 {
                    issues.push("Experience bullets do not reflect the job's requirements"
                        .to_string());
                }
                if title < 0.5 {
                    issues.push("No role title close to the target job title".to_string());
                }
                computed
            }
        }
        Tier::Education => {
            let education = frac(ScoreParameter::EducationMatch);
            if education < 0.5 {
                issues.push("Education section is missing or lacks a listed degree".to_string());
            }
            education
        }
        Tier::Certifications => {
            let certs = frac(ScoreParameter::Certifications);
            if certs == 0.0 {
                issues.push("No certifications listed".to_string());
            }
            certs
        }
        Tier::SkillsKeywords => {
            let keywords = frac(ScoreParameter::KeywordMatch);
            let skills = frac(ScoreParameter::SkillsAlignment);
            if keywords < 0.5 {
                issues.push("Resume misses many keywords from the job description".to_string());
            }
            if skills < 0.5 {
                issues.push("Listed skills do not cover the job's required stack".to_string());
            }
            keywords * 0.55 + skills * 0.45
        }
        Tier::Projects => {
            let projects = frac(ScoreParameter::ProjectsRelevance);
            if projects == 0.0 {
                issues.push("No projects listed".to_string());
            } else if projects < 0.6 {
                issues.push("Projects do not demonstrate the job's tech stack".to_string());
            }
            projects
        }
        Tier::RedFlags => {
            // Inverse tier: start clean and subtract for warning signs
            let mut clean: f32 = 1.0;
            if frac(ScoreParameter::ContactInfo) < 0.6 {
                clean -= 0.3;
                issues.push("Hard to contact: missing email or phone".to_string());
            }
            if frac(ScoreParameter::ResumeLength) < 0.4 {
                clean -= 0.3;
                issues.push("Resume is far too short or far too long".to_string());
            }
            if frac(ScoreParameter::FormattingConsistency) < 0.4 {
                clean -= 0.2;
                issues.push("Inconsistent formatting across roles".to_string());
            }
            if frac(ScoreParameter::FilenameHygiene) == 0.0 {
                clean -= 0.2;
                issues.push("Unprofessional file name".to_string());
            }
            clean.max(0.0)
        }
        Tier::CompetitiveSignals => {
            let quantified = frac(ScoreParameter::QuantifiedAchievements);
            let certs = frac(ScoreParameter::Certifications);
            let projects = frac(ScoreParameter::ProjectsRelevance);
            if quantified < 0.5 && certs < 0.5 {
                issues.push("Few differentiators versus other applicants".to_string());
            }
            quantified * 0.5 + certs * 0.2 + projects * 0.3
        }
        Tier::CultureFit => {
            // Soft-skill vocabulary overlap with the JD; neutral default
            // without a JD
            match input.job.filter(|_| input.jd_mode()) {
                Some(job) => {
                    let soft_requirements: Vec<&crate::model::job::JobRequirement> = job
                        .requirements
                        .iter()
                        .filter(|r| {
                            r.category == crate::model::job::RequirementCategory::SoftSkill
                        })
                        .collect();
                    if soft_requirements.is_empty() {
                        0.6
                    } else {
                        let resume_lower = input.resume_text.to_lowercase();
                        let met = soft_requirements
                            .iter()
                            .filter(|r| {
                                r.keywords.iter().any(|k| resume_lower.contains(k.as_str()))
                            })
                            .count();
                        let fraction = met as f32 / soft_requirements.len() as f32;
                        if fraction < 0.5 {
                            issues.push(
                                "Soft skills the posting asks for are not evidenced".to_string(),
                            );
                        }
                        fraction
                    }
                }
                None => 0.6,
            }
        }
    };

    let weight = tier.weight(fresher);
    let fraction = percentage_fraction.clamp(0.0, 1.0);
    TierScore {
        tier,
        score: fraction * weight as f32,
        max: weight as f32,
        weight,
        percentage: fraction * 100.0,
        top_issues: issues,
    }
}

/// Structural issues phrased per missing section, used by the pipeline's
/// user-input step.
pub fn missing_section_issues(missing: &[SectionId]) -> Vec<String> {
    missing
        .iter()
        .map(|s| format!("Missing section: {}", s))
        .collect()
}
