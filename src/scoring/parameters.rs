//! The 16 scoring primitives
//!
//! Each primitive is a pure function from `(resume text, resume data,
//! job profile)` to an integer in `[0, max]`. No randomness, no clocks,
//! no I/O: identical inputs always yield identical scores. Missing or
//! malformed input degrades to 0 or a small floor, never an error.
//!
//! Two operating modes:
//! - JD mode (job profile present, JD text at least `jd_min_chars` long):
//!   parameters compare resume content against extracted JD keywords,
//!   skills and titles. A matched-keyword ratio under the hard cap (20%)
//!   caps the keyword/skills parameters at 20% of their maximum; under
//!   the soft cap (40%) at 50%. The caps are deliberate cliffs: a resume
//!   in the wrong domain must not score well on formatting alone.
//! - General mode (no JD): parameters assess the resume in isolation.

use crate::config::ScoringConfig;
use crate::model::job::JobProfile;
use crate::model::resume::ResumeSnapshot;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Closed set of scoring parameters. Maxima sum to 138; the displayed
/// ATS total clamps at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreParameter {
    KeywordMatch,
    SkillsAlignment,
    ExperienceRelevance,
    QuantifiedAchievements,
    JobTitleMatch,
    EducationMatch,
    SectionCompleteness,
    ActionVerbs,
    Certifications,
    ProjectsRelevance,
    ResumeLength,
    SummaryQuality,
    FormattingConsistency,
    ContactInfo,
    FilenameHygiene,
    WordVariety,
}

impl ScoreParameter {
    pub const ALL: [ScoreParameter; 16] = [
        ScoreParameter::KeywordMatch,
        ScoreParameter::SkillsAlignment,
        ScoreParameter::ExperienceRelevance,
        ScoreParameter::QuantifiedAchievements,
        ScoreParameter::JobTitleMatch,
        ScoreParameter::EducationMatch,
        ScoreParameter::SectionCompleteness,
        ScoreParameter::ActionVerbs,
        ScoreParameter::Certifications,
        ScoreParameter::ProjectsRelevance,
        ScoreParameter::ResumeLength,
        ScoreParameter::SummaryQuality,
        ScoreParameter::FormattingConsistency,
        ScoreParameter::ContactInfo,
        ScoreParameter::FilenameHygiene,
        ScoreParameter::WordVariety,
    ];

    pub fn max_points(&self) -> u32 {
        match self {
            ScoreParameter::KeywordMatch => 25,
            ScoreParameter::SkillsAlignment => 20,
            ScoreParameter::ExperienceRelevance => 15,
            ScoreParameter::QuantifiedAchievements => 12,
            ScoreParameter::JobTitleMatch => 10,
            ScoreParameter::EducationMatch => 8,
            ScoreParameter::SectionCompleteness => 8,
            ScoreParameter::ActionVerbs => 7,
            ScoreParameter::Certifications => 6,
            ScoreParameter::ProjectsRelevance => 6,
            ScoreParameter::ResumeLength => 5,
            ScoreParameter::SummaryQuality => 5,
            ScoreParameter::FormattingConsistency => 4,
            ScoreParameter::ContactInfo => 3,
            ScoreParameter::FilenameHygiene => 2,
            ScoreParameter::WordVariety => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoreParameter::KeywordMatch => "keyword_match",
            ScoreParameter::SkillsAlignment => "skills_alignment",
            ScoreParameter::ExperienceRelevance => "experience_relevance",
            ScoreParameter::QuantifiedAchievements => "quantified_achievements",
            ScoreParameter::JobTitleMatch => "job_title_match",
            ScoreParameter::EducationMatch => "education_match",
            ScoreParameter::SectionCompleteness => "section_completeness",
            ScoreParameter::ActionVerbs => "action_verbs",
            ScoreParameter::Certifications => "certifications",
            ScoreParameter::ProjectsRelevance => "projects_relevance",
            ScoreParameter::ResumeLength => "resume_length",
            ScoreParameter::SummaryQuality => "summary_quality",
            ScoreParameter::FormattingConsistency => "formatting_consistency",
            ScoreParameter::ContactInfo => "contact_info",
            ScoreParameter::FilenameHygiene => "filename_hygiene",
            ScoreParameter::WordVariety => "word_variety",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterScore {
    pub parameter: ScoreParameter,
    pub score: u32,
    pub max: u32,
}

/// Borrowed view of everything a primitive may consult.
pub struct ScoringInput<'a> {
    pub resume_text: &'a str,
    pub resume: Option<&'a ResumeSnapshot>,
    pub job: Option<&'a JobProfile>,
    pub config: &'a ScoringConfig,
}

impl<'a> ScoringInput<'a> {
    /// JD mode is active only when a profile exists and the JD text
    /// clears the minimum length.
    pub fn jd_mode(&self) -> bool {
        self.job
            .map(|j| j.text.chars().count() >= self.config.jd_min_chars)
            .unwrap_or(false)
    }

    /// Fraction of JD keywords found verbatim (case-insensitive) in the
    /// resume text. 1.0 when not in JD mode so caps never fire.
    pub fn matched_keyword_ratio(&self) -> f32 {
        if !self.jd_mode() {
            return 1.0;
        }
        let job = self.job.expect("jd_mode checked");
        if job.keywords.is_empty() {
            return 1.0;
        }
        let haystack = self.resume_text.to_lowercase();
        let matched = job
            .keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .count();
        matched as f32 / job.keywords.len() as f32
    }
}

/// Score a single parameter. The workhorse entry point for the engine.
pub fn score(parameter: ScoreParameter, input: &ScoringInput<'_>) -> u32 {
    let max = parameter.max_points();
    let raw = match parameter {
        ScoreParameter::KeywordMatch => keyword_match(input),
        ScoreParameter::SkillsAlignment => skills_alignment(input),
        ScoreParameter::ExperienceRelevance => experience_relevance(input),
        ScoreParameter::QuantifiedAchievements => quantified_achievements(input),
        ScoreParameter::JobTitleMatch => job_title_match(input),
        ScoreParameter::EducationMatch => education_match(input),
        ScoreParameter::SectionCompleteness => section_completeness(input),
        ScoreParameter::ActionVerbs => action_verbs(input),
        ScoreParameter::Certifications => certifications(input),
        ScoreParameter::ProjectsRelevance => projects_relevance(input),
        ScoreParameter::ResumeLength => resume_length(input),
        ScoreParameter::SummaryQuality => summary_quality(input),
        ScoreParameter::FormattingConsistency => formatting_consistency(input),
        ScoreParameter::ContactInfo => contact_info(input),
        ScoreParameter::FilenameHygiene => filename_hygiene(input),
        ScoreParameter::WordVariety => word_variety(input),
    };

    let capped = apply_domain_cap(parameter, raw, max, input);
    capped.min(max)
}

/// Score all 16 parameters in declaration order.
pub fn score_all(input: &ScoringInput<'_>) -> Vec<ParameterScore> {
    ScoreParameter::ALL
        .iter()
        .map(|p| ParameterScore {
            parameter: *p,
            score: score(*p, input),
            max: p.max_points(),
        })
        .collect()
}

/// Domain-mismatch caps apply only to the JD-comparative parameters.
fn apply_domain_cap(
    parameter: ScoreParameter,
    raw: u32,
    max: u32,
    input: &ScoringInput<'_>,
) -> u32 {
    let capped_parameters = [
        ScoreParameter::KeywordMatch,
        ScoreParameter::SkillsAlignment,
        ScoreParameter::ExperienceRelevance,
    ];
    if !capped_parameters.contains(&parameter) || !input.jd_mode() {
        return raw;
    }

    let ratio = input.matched_keyword_ratio();
    if ratio < input.config.domain_mismatch_hard_cap {
        raw.min((max as f32 * 0.20).floor() as u32)
    } else if ratio < input.config.domain_mismatch_soft_cap {
        raw.min((max as f32 * 0.50).floor() as u32)
    } else {
        raw
    }
}

fn scale(fraction: f32, max: u32) -> u32 {
    let clamped = fraction.clamp(0.0, 1.0);
    (clamped * max as f32).round() as u32
}

// --- JD-comparative primitives ---

fn keyword_match(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::KeywordMatch.max_points();
    if input.jd_mode() {
        scale(input.matched_keyword_ratio(), max)
    } else {
        // General mode: reward presence of recognizable skill vocabulary
        let found = crate::model::job::find_known_skills(input.resume_text).len();
        scale(found as f32 / 12.0, max)
    }
}

fn skills_alignment(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::SkillsAlignment.max_points();
    match input.job.filter(|_| input.jd_mode()) {
        Some(job) => {
            if job.skills.is_empty() {
                // No extractable skills in JD, fall back to keyword ratio
                return scale(input.matched_keyword_ratio(), max);
            }
            let haystack = input.resume_text.to_lowercase();
            let matched = job
                .skills
                .iter()
                .filter(|s| haystack.contains(s.as_str()))
                .count();
            scale(matched as f32 / job.skills.len() as f32, max)
        }
        None => {
            let listed = input
                .resume
                .map(|r| r.all_skills().len())
                .unwrap_or_else(|| crate::model::job::find_known_skills(input.resume_text).len());
            scale(listed as f32 / 10.0, max)
        }
    }
}

fn experience_relevance(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::ExperienceRelevance.max_points();
    let Some(resume) = input.resume else {
        // Text-only scoring: look for an experience section at all
        let has_experience = input.resume_text.to_lowercase().contains("experience");
        return if has_experience { max / 2 } else { 0 };
    };

    if resume.experience.is_empty() {
        return 0;
    }

    match input.job.filter(|_| input.jd_mode()) {
        Some(job) => {
            // How many experience bullets mention any JD keyword
            let bullets: Vec<String> = resume
                .experience
                .iter()
                .flat_map(|e| e.bullets.iter().map(|b| b.to_lowercase()))
                .collect();
            if bullets.is_empty() {
                return scale(0.2, max);
            }
            let relevant = bullets
                .iter()
                .filter(|b| job.keywords.iter().any(|k| b.contains(k.as_str())))
                .count();
            scale(relevant as f32 / bullets.len() as f32, max)
        }
        None => {
            // General mode: depth of the experience section
            let roles = resume.experience.len();
            let bullet_count: usize = resume.experience.iter().map(|e| e.bullets.len()).sum();
            scale((roles as f32 / 3.0) * 0.4 + (bullet_count as f32 / 9.0) * 0.6, max)
        }
    }
}

fn quantified_achievements(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::QuantifiedAchievements.max_points();
    let bullets = collect_bullets(input);
    if bullets.is_empty() {
        return 0;
    }
    let quantified = bullets.iter().filter(|b| is_quantified(b)).count();
    // A third of bullets carrying numbers is full marks
    scale(quantified as f32 / bullets.len() as f32 * 3.0, max)
}

fn job_title_match(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::JobTitleMatch.max_points();
    match input.job.filter(|_| input.jd_mode()) {
        Some(job) => {
            if job.titles.is_empty() {
                return max / 2;
            }
            let resume_lower = input.resume_text.to_lowercase();
            let exact = job.titles.iter().any(|t| resume_lower.contains(t.as_str()));
            if exact {
                return max;
            }
            // Near-miss titles ("sr. backend developer" vs "backend developer")
            // earn most of the credit
            let fuzzy = input.resume.map_or(false, |r| {
                r.experience.iter().any(|exp| {
                    let role = exp.role.to_lowercase();
                    job.titles
                        .iter()
                        .any(|t| strsim::jaro_winkler(&role, t) >= 0.85)
                })
            });
            if fuzzy {
                return max * 3 / 4;
            }
            // Partial credit when the role family matches (shared last word,
            // e.g. "engineer")
            let family_hit = job.titles.iter().any(|t| {
                t.split_whitespace()
                    .last()
                    .map(|family| resume_lower.contains(family))
                    .unwrap_or(false)
            });
            if family_hit {
                max / 2
            } else {
                0
            }
        }
        None => {
            let has_title = input
                .resume
                .map(|r| !r.experience.is_empty())
                .unwrap_or(false);
            if has_title {
                max / 2
            } else {
                0
            }
        }
    }
}

fn education_match(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::EducationMatch.max_points();
    let Some(resume) = input.resume else {
        let lower = input.resume_text.to_lowercase();
        return if lower.contains("bachelor") || lower.contains("master") || lower.contains("b.s")
        {
            max / 2
        } else {
            0
        };
    };

    if resume.education.is_empty() {
        return 0;
    }

    let mut fraction: f32 = 0.6; // any degree on record
    let degrees_lower: Vec<String> = resume
        .education
        .iter()
        .map(|e| e.degree.to_lowercase())
        .collect();
    if degrees_lower
        .iter()
        .any(|d| d.contains("master") || d.contains("phd") || d.contains("bachelor"))
    {
        fraction += 0.2;
    }

    if let Some(job) = input.job.filter(|_| input.jd_mode()) {
        let jd_lower = job.text.to_lowercase();
        let asks_degree = jd_lower.contains("degree")
            || jd_lower.contains("bachelor")
            || jd_lower.contains("master");
        if asks_degree {
            fraction += 0.2;
        }
    } else {
        fraction += 0.2;
    }

    scale(fraction, max)
}

fn section_completeness(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::SectionCompleteness.max_points();
    match input.resume {
        Some(resume) => {
            let present = crate::model::resume::SectionId::ALL
                .iter()
                .filter(|s| resume.has_section(**s))
                .count();
            scale(present as f32 / 7.0, max)
        }
        None => {
            let lower = input.resume_text.to_lowercase();
            let headers = ["experience", "education", "skills", "summary", "projects"];
            let present = headers.iter().filter(|h| lower.contains(*h)).count();
            scale(present as f32 / headers.len() as f32, max)
        }
    }
}

fn action_verbs(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::ActionVerbs.max_points();
    let bullets = collect_bullets(input);
    if bullets.is_empty() {
        return 0;
    }
    let strong = bullets
        .iter()
        .filter(|b| starts_with_action_verb(b))
        .count();
    scale(strong as f32 / bullets.len() as f32, max)
}

fn certifications(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::Certifications.max_points();
    let count = match input.resume {
        Some(resume) => resume.certifications.len(),
        None => {
            if input.resume_text.to_lowercase().contains("certif") {
                1
            } else {
                0
            }
        }
    };
    scale(count as f32 / 2.0, max)
}

fn projects_relevance(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::ProjectsRelevance.max_points();
    let Some(resume) = input.resume else {
        return if input.resume_text.to_lowercase().contains("projects") {
            max / 2
        } else {
            0
        };
    };

    if resume.projects.is_empty() {
        return 0;
    }

    match input.job.filter(|_| input.jd_mode()) {
        Some(job) => {
            let relevant = resume
                .projects
                .iter()
                .filter(|p| {
                    let text = format!("{} {}", p.title, p.bullets.join(" ")).to_lowercase();
                    job.keywords.iter().any(|k| text.contains(k.as_str()))
                })
                .count();
            let base = 0.4; // projects exist at all
            scale(base + 0.6 * relevant as f32 / resume.projects.len() as f32, max)
        }
        None => scale(0.4 + 0.2 * resume.projects.len().min(3) as f32, max),
    }
}

fn resume_length(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::ResumeLength.max_points();
    let len = input.resume_text.chars().count();
    let (lo, hi) = (input.config.length_band_min, input.config.length_band_max);
    if len == 0 {
        0
    } else if len >= lo && len <= hi {
        max
    } else if len < lo {
        scale(len as f32 / lo as f32, max)
    } else {
        // Over-long resumes lose points gradually
        scale(hi as f32 / len as f32, max)
    }
}

fn summary_quality(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::SummaryQuality.max_points();
    let summary = match input.resume {
        Some(resume) => resume.summary.clone().unwrap_or_default(),
        None => String::new(),
    };
    if summary.trim().is_empty() {
        return 0;
    }

    let len = summary.chars().count();
    let mut fraction: f32 = if (120..=600).contains(&len) { 0.6 } else { 0.3 };

    if let Some(job) = input.job.filter(|_| input.jd_mode()) {
        let lower = summary.to_lowercase();
        if job.keywords.iter().take(20).any(|k| lower.contains(k.as_str())) {
            fraction += 0.4;
        }
    } else {
        fraction += 0.4;
    }

    scale(fraction, max)
}

fn formatting_consistency(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::FormattingConsistency.max_points();
    let Some(resume) = input.resume else {
        let has_bullets = input
            .resume_text
            .lines()
            .any(|l| l.trim_start().starts_with(['-', '*', '\u{2022}']));
        return if has_bullets { max / 2 } else { 0 };
    };

    let mut fraction: f32 = 0.0;
    let with_dates = resume
        .experience
        .iter()
        .filter(|e| e.date_range.is_some())
        .count();
    if !resume.experience.is_empty() && with_dates == resume.experience.len() {
        fraction += 0.5;
    } else if with_dates > 0 {
        fraction += 0.25;
    }
    if resume.experience.iter().all(|e| !e.bullets.is_empty())
        && !resume.experience.is_empty()
    {
        fraction += 0.5;
    }
    scale(fraction, max)
}

fn contact_info(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::ContactInfo.max_points();
    match input.resume {
        Some(resume) => {
            let mut present = 0;
            if resume.contact.name.is_some() {
                present += 1;
            }
            if resume.contact.email.is_some() {
                present += 1;
            }
            if resume.contact.phone.is_some() {
                present += 1;
            }
            scale(present as f32 / 3.0, max)
        }
        None => {
            let email_re = email_regex();
            if email_re.is_match(input.resume_text) {
                max / 2 + 1
            } else {
                0
            }
        }
    }
}

fn filename_hygiene(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::FilenameHygiene.max_points();
    let Some(name) = input.resume.and_then(|r| r.file_name.as_deref()) else {
        // No file provenance: neutral floor rather than a penalty
        return max / 2;
    };
    let lower = name.to_lowercase();
    let bad = ["untitled", "document", "new doc", "final_final", "copy of"];
    if bad.iter().any(|b| lower.contains(b)) {
        return 0;
    }
    let mut fraction: f32 = 0.5;
    if lower.contains("resume") || lower.contains("cv") {
        fraction += 0.25;
    }
    if !name.contains(' ') {
        fraction += 0.25;
    }
    scale(fraction, max)
}

fn word_variety(input: &ScoringInput<'_>) -> u32 {
    let max = ScoreParameter::WordVariety.max_points();
    let bullets = collect_bullets(input);
    if bullets.is_empty() {
        return 0;
    }
    let leads: Vec<String> = bullets
        .iter()
        .filter_map(|b| b.unicode_words().next())
        .map(|w| w.to_lowercase())
        .collect();
    if leads.is_empty() {
        return 0;
    }
    let mut distinct: Vec<&String> = Vec::new();
    for lead in &leads {
        if !distinct.contains(&lead) {
            distinct.push(lead);
        }
    }
    scale(distinct.len() as f32 / leads.len() as f32, max)
}

// --- shared helpers ---

fn collect_bullets(input: &ScoringInput<'_>) -> Vec<String> {
    if let Some(resume) = input.resume {
        let tagged = resume.tagged_bullets();
        if !tagged.is_empty() {
            return tagged.into_iter().map(|(_, b)| b).collect();
        }
    }
    input
        .resume_text
        .lines()
        .filter_map(|l| {
            let trimmed = l.trim();
            if trimmed.starts_with(['-', '*', '\u{2022}']) {
                Some(trimmed.trim_start_matches(['-', '*', '\u{2022}']).trim().to_string())
            } else {
                None
            }
        })
        .collect()
}

pub(crate) fn is_quantified(bullet: &str) -> bool {
    static QUANT_RE: OnceLock<Regex> = OnceLock::new();
    let re = QUANT_RE.get_or_init(|| {
        Regex::new(r"\d+(\.\d+)?\s*(%|percent|x\b|ms\b|k\b|m\b|users|requests|hours|days)|\$\d|\b\d{2,}\b")
            .expect("invalid quantification regex")
    });
    re.is_match(&bullet.to_lowercase())
}

pub(crate) fn starts_with_action_verb(bullet: &str) -> bool {
    let first = bullet
        .unicode_words()
        .next()
        .map(|w| w.to_lowercase())
        .unwrap_or_default();
    ACTION_VERBS.contains(&first.as_str())
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("invalid email regex")
    })
}

const ACTION_VERBS: &[&str] = &[
    "achieved", "architected", "automated", "built", "created", "delivered", "designed",
    "developed", "drove", "engineered", "established", "implemented", "improved",
    "increased", "launched", "led", "maintained", "managed", "migrated", "optimized",
    "orchestrated", "owned", "reduced", "refactored", "scaled", "shipped", "streamlined",
];
