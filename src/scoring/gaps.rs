//! Gap analysis: shortfalls against maximum scores, prioritized remediation

use crate::model::job::{JobProfile, RequirementPriority};
use crate::model::resume::ResumeSnapshot;
use crate::scoring::critical::CriticalMetric;
use crate::scoring::engine::{ComprehensiveScore, ScoringEngine};
use crate::scoring::tiers::Tier;
use serde::{Deserialize, Serialize};

/// Priority bucket for a gap: under half of max is critical, under 70%
/// is high, the rest medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPriority {
    Critical,
    High,
    Medium,
}

impl GapPriority {
    pub fn from_percentage(percentage: f32) -> Self {
        if percentage < 50.0 {
            GapPriority::Critical
        } else if percentage < 70.0 {
            GapPriority::High
        } else {
            GapPriority::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierGap {
    pub tier: Tier,
    pub gap: f32,
    pub percentage: f32,
    pub priority: GapPriority,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Big5Gap {
    pub metric: CriticalMetric,
    pub gap: u32,
    pub percentage: f32,
    pub priority: GapPriority,
    pub actions: Vec<String>,
}

/// Where an improvement came from; critical-metric improvements always
/// outrank tier improvements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementSource {
    CriticalMetric,
    Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub title: String,
    /// Expected score impact; critical-metric impacts arrive pre-doubled.
    pub impact: f32,
    pub source: ImprovementSource,
    pub actions: Vec<String>,
}

/// JD keywords absent from the resume, bucketed by how badly they hurt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingKeywordBuckets {
    pub critical: Vec<String>,
    pub important: Vec<String>,
    pub optional: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysisResult {
    pub score: ComprehensiveScore,
    pub tier_gaps: Vec<TierGap>,
    pub big5_gaps: Vec<Big5Gap>,
    pub prioritized_improvements: Vec<Improvement>,
    pub missing_keywords: MissingKeywordBuckets,
}

impl GapAnalysisResult {
    pub fn top_improvements(&self, n: usize) -> &[Improvement] {
        &self.prioritized_improvements[..self.prioritized_improvements.len().min(n)]
    }
}

/// Run the full gap analysis. Propagates no failure of its own: it is a
/// pure function of the score it computes.
pub fn analyze_gaps(
    engine: &ScoringEngine,
    resume: Option<&ResumeSnapshot>,
    resume_text: &str,
    job_description: Option<&str>,
) -> GapAnalysisResult {
    let profile = job_description
        .filter(|jd| jd.chars().count() >= engine.config().jd_min_chars)
        .map(|jd| JobProfile::extract(jd, engine.config()));

    analyze_gaps_with_profile(engine, resume, resume_text, profile.as_ref())
}

pub fn analyze_gaps_with_profile(
    engine: &ScoringEngine,
    resume: Option<&ResumeSnapshot>,
    resume_text: &str,
    profile: Option<&JobProfile>,
) -> GapAnalysisResult {
    let score = engine.calculate_with_profile(resume_text, resume, profile);

    let tier_gaps: Vec<TierGap> = score
        .tiers
        .iter()
        .filter(|t| t.percentage < 100.0)
        .map(|t| TierGap {
            tier: t.tier,
            gap: t.max - t.score,
            percentage: t.percentage,
            priority: GapPriority::from_percentage(t.percentage),
            issues: t.top_issues.clone(),
        })
        .collect();

    let big5_gaps: Vec<Big5Gap> = score
        .critical_metrics
        .iter()
        .filter(|m| m.percentage < 100.0)
        .map(|m| Big5Gap {
            metric: m.metric,
            gap: m.max - m.score,
            percentage: m.percentage,
            priority: GapPriority::from_percentage(m.percentage),
            actions: remediation_actions(m.metric),
        })
        .collect();

    let prioritized_improvements = prioritize(&tier_gaps, &big5_gaps);
    let missing_keywords = bucket_missing_keywords(resume_text, profile);

    GapAnalysisResult {
        score,
        tier_gaps,
        big5_gaps,
        prioritized_improvements,
        missing_keywords,
    }
}

/// Merge both gap lists into one total order: critical-metric items first
/// (their impact is pre-doubled), then descending impact, then insertion
/// order. Stable and reproducible for identical scores.
fn prioritize(tier_gaps: &[TierGap], big5_gaps: &[Big5Gap]) -> Vec<Improvement> {
    let mut improvements: Vec<Improvement> = Vec::new();

    for gap in big5_gaps {
        improvements.push(Improvement {
            title: format!("Raise {} ({}% of max)", gap.metric.label(), gap.percentage as u32),
            impact: gap.gap as f32 * 2.0,
            source: ImprovementSource::CriticalMetric,
            actions: gap.actions.clone(),
        });
    }

    for gap in tier_gaps {
        improvements.push(Improvement {
            title: format!("Improve {} tier ({}% of max)", gap.tier.label(), gap.percentage as u32),
            impact: gap.gap,
            source: ImprovementSource::Tier,
            actions: gap.issues.clone(),
        });
    }

    // Stable sort keeps insertion order for equal keys
    improvements.sort_by(|a, b| {
        let a_critical = a.source == ImprovementSource::CriticalMetric;
        let b_critical = b.source == ImprovementSource::CriticalMetric;
        b_critical
            .cmp(&a_critical)
            .then_with(|| b.impact.partial_cmp(&a.impact).unwrap_or(std::cmp::Ordering::Equal))
    });

    improvements
}

/// Canned, reviewed remediation text per critical metric.
fn remediation_actions(metric: CriticalMetric) -> Vec<String> {
    let actions: &[&str] = match metric {
        CriticalMetric::JdKeywordMatch => &[
            "Mirror the job description's exact terminology in your bullets",
            "Add a skills line covering the posting's most-repeated keywords",
            "Rename generic phrases to the tools the posting names",
        ],
        CriticalMetric::TechnicalSkillsAlignment => &[
            "List every required technology you have actually used",
            "Show each core skill inside an experience or project bullet",
        ],
        CriticalMetric::QuantifiedResults => &[
            "Add a number, percentage or scale to your strongest bullets",
            "Lead with the measurable outcome, then the method",
        ],
        CriticalMetric::JobTitleRelevance => &[
            "Align your most recent title with the target role's phrasing",
            "Use the target title in your summary line",
        ],
        CriticalMetric::ExperienceRelevance => &[
            "Reorder bullets so role-relevant work comes first",
            "Cut bullets that do not speak to this job's requirements",
            "Expand the most relevant role with concrete responsibilities",
        ],
    };
    actions.iter().map(|s| s.to_string()).collect()
}

/// Bucket JD keywords absent from the resume: must-have requirement
/// keywords are critical, extractable skills important, the rest optional.
fn bucket_missing_keywords(
    resume_text: &str,
    profile: Option<&JobProfile>,
) -> MissingKeywordBuckets {
    let Some(job) = profile else {
        return MissingKeywordBuckets::default();
    };
    let haystack = resume_text.to_lowercase();

    let must_have_keywords: Vec<&String> = job
        .requirements
        .iter()
        .filter(|r| r.priority == RequirementPriority::MustHave)
        .flat_map(|r| r.keywords.iter())
        .collect();

    let mut buckets = MissingKeywordBuckets::default();
    for keyword in &job.keywords {
        if haystack.contains(keyword.as_str()) {
            continue;
        }
        let is_skill = job.skills.iter().any(|s| s == keyword);
        let is_must_have = must_have_keywords.iter().any(|k| *k == keyword);
        let bucket = if is_skill && is_must_have {
            &mut buckets.critical
        } else if is_skill || is_must_have {
            &mut buckets.important
        } else {
            &mut buckets.optional
        };
        if !bucket.contains(keyword) {
            bucket.push(keyword.clone());
        }
    }
    buckets
}
