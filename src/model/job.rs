//! Job-description extraction: requirements, keywords, titles
//!
//! Extraction runs once per job description; everything derived here is
//! immutable afterwards and feeds both the scoring primitives (JD mode)
//! and the hybrid matcher.

use crate::config::ScoringConfig;
use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// One extracted unit of the job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequirement {
    pub text: String,
    pub category: RequirementCategory,
    pub keywords: Vec<String>,
    pub priority: RequirementPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    Technical,
    Experience,
    SoftSkill,
    Domain,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementPriority {
    MustHave,
    NiceToHave,
}

/// Everything the engine needs to know about a job description,
/// derived once up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProfile {
    pub text: String,
    pub keywords: Vec<String>,
    pub skills: Vec<String>,
    pub titles: Vec<String>,
    pub requirements: Vec<JobRequirement>,
    pub fresher: bool,
}

impl JobProfile {
    /// Extract the profile from raw job-description text.
    pub fn extract(jd_text: &str, config: &ScoringConfig) -> Self {
        let skills = find_known_skills(jd_text);
        let titles = find_titles(jd_text);
        let requirements = extract_requirements(jd_text);

        // Keywords: known skills plus high-signal tokens from requirement lines
        let mut keywords: Vec<String> = skills.clone();
        for req in &requirements {
            for kw in &req.keywords {
                if !keywords.iter().any(|k| k == kw) {
                    keywords.push(kw.clone());
                }
            }
        }

        let fresher = detect_fresher(jd_text, config);

        Self {
            text: jd_text.to_string(),
            keywords,
            skills,
            titles,
            requirements,
            fresher,
        }
    }

    pub fn is_fresher(&self) -> bool {
        self.fresher
    }
}

/// Entry-level detection via keyword heuristics. A posting that asks for
/// explicit seniority is never classified as fresher, even if it also
/// mentions "recent graduates welcome".
fn detect_fresher(jd_text: &str, config: &ScoringConfig) -> bool {
    let lower = jd_text.to_lowercase();

    let senior_re = Regex::new(r"(?i)\b(senior|staff|principal|lead)\b|\b([5-9]|1[0-9])\+?\s*years")
        .expect("invalid seniority regex");
    if senior_re.is_match(&lower) {
        return false;
    }

    config.fresher_keywords.iter().any(|kw| lower.contains(kw.as_str()))
}

/// Extract requirement units from the job description: bullet lines and
/// sentences introduced by requirement phrasing. Prose postings get one
/// requirement per sentence, so a "preferred" in one sentence cannot
/// downgrade a must-have in the next.
pub fn extract_requirements(jd_text: &str) -> Vec<JobRequirement> {
    let requirement_re = Regex::new(
        r"(?i)(required|must have|should have|experience (with|in)|knowledge of|proficien|familiar(ity)? with|expertise in|responsible for|ability to|preferred|nice to have|a plus|bonus|desirable)",
    )
    .expect("invalid requirement regex");
    // '.' only ends a sentence before whitespace or end of line, so dotted
    // tokens like node.js survive the split
    let sentence_re = Regex::new(r"\.\s+|\.$|;").expect("invalid sentence regex");

    let mut requirements = Vec::new();

    for line in jd_text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let is_bullet = trimmed.starts_with('-')
            || trimmed.starts_with('*')
            || trimmed.starts_with('\u{2022}');
        let body = trimmed.trim_start_matches(['-', '*', '\u{2022}']).trim();

        for sentence in sentence_re.split(body) {
            let text = sentence.trim();
            if text.len() < 8 {
                continue;
            }
            if !is_bullet && !requirement_re.is_match(text) {
                continue;
            }

            let text = text.to_string();
            let keywords = extract_keywords(&text);
            let category = infer_category(&text, &keywords);
            let priority = infer_priority(&text);

            requirements.push(JobRequirement {
                text,
                category,
                keywords,
                priority,
            });
        }
    }

    requirements
}

fn infer_category(text: &str, keywords: &[String]) -> RequirementCategory {
    let lower = text.to_lowercase();

    let has_tech = keywords
        .iter()
        .any(|k| tech_skill_set().contains(k.as_str()));
    if has_tech {
        return RequirementCategory::Technical;
    }

    let experience_re =
        Regex::new(r"(?i)\d+\+?\s*years?|experience\b|track record").expect("invalid regex");
    if experience_re.is_match(&lower) {
        return RequirementCategory::Experience;
    }

    if SOFT_SKILLS.iter().any(|s| lower.contains(s)) {
        return RequirementCategory::SoftSkill;
    }

    if DOMAIN_TERMS.iter().any(|s| lower.contains(s)) {
        return RequirementCategory::Domain;
    }

    RequirementCategory::General
}

fn infer_priority(text: &str) -> RequirementPriority {
    let lower = text.to_lowercase();
    let nice = ["preferred", "nice to have", "a plus", "bonus", "desirable", "ideally"];
    if nice.iter().any(|p| lower.contains(p)) {
        RequirementPriority::NiceToHave
    } else {
        RequirementPriority::MustHave
    }
}

/// Tokenize text into lowercase keyword candidates, dropping stop words
/// and short tokens.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for word in text.unicode_words() {
        let normalized = word.to_lowercase();
        if normalized.len() < 3 {
            continue;
        }
        if STOP_WORDS.contains(&normalized.as_str()) {
            continue;
        }
        if !normalized.chars().any(|c| c.is_alphabetic()) {
            continue;
        }
        if seen.insert(normalized.clone()) {
            keywords.push(normalized);
        }
    }

    keywords
}

/// Scan text for skills from the built-in database, longest match first.
pub fn find_known_skills(text: &str) -> Vec<String> {
    let mut patterns: Vec<&str> = tech_skill_set().into_iter().collect();
    patterns.sort_by(|a, b| b.len().cmp(&a.len()));

    let matcher = AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(aho_corasick::MatchKind::LeftmostLongest)
        .build(&patterns)
        .expect("skill database patterns are static and valid");

    let mut found = Vec::new();
    let mut seen = HashSet::new();
    for mat in matcher.find_iter(text) {
        let skill = patterns[mat.pattern().as_usize()].to_string();
        if seen.insert(skill.clone()) {
            found.push(skill);
        }
    }
    found
}

/// Extract job titles mentioned in the text.
pub fn find_titles(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    ROLE_TITLES
        .iter()
        .filter(|t| lower.contains(*t))
        .map(|t| t.to_string())
        .collect()
}

fn tech_skill_set() -> HashSet<&'static str> {
    TECH_SKILLS.iter().copied().collect()
}

pub(crate) const TECH_SKILLS: &[&str] = &[
    // Languages
    "rust", "python", "javascript", "typescript", "java", "c++", "c#", "golang", "go",
    "ruby", "php", "swift", "kotlin", "scala", "sql", "r", "matlab",
    // Web
    "react", "vue", "angular", "svelte", "html", "css", "node.js", "nodejs", "express",
    "django", "flask", "spring", "rails", "nextjs", "graphql", "rest",
    // Infrastructure
    "docker", "kubernetes", "aws", "azure", "gcp", "terraform", "ansible", "jenkins",
    "linux", "git", "ci/cd", "microservices", "grpc", "nginx", "redis",
    // Data stores
    "postgresql", "postgres", "mysql", "mongodb", "cassandra", "dynamodb", "sqlite",
    "elasticsearch", "kafka",
    // Data/ML
    "machine learning", "deep learning", "tensorflow", "pytorch", "pandas", "numpy",
    "spark", "hadoop", "airflow", "data analysis", "etl",
    // Mobile/embedded
    "android", "ios", "react native", "flutter", "embedded", "firmware", "rtos",
    // Practices
    "agile", "scrum", "tdd", "unit testing", "selenium", "cypress",
];

const SOFT_SKILLS: &[&str] = &[
    "communication", "leadership", "teamwork", "collaboration", "problem solving",
    "mentoring", "ownership", "time management", "stakeholder", "presentation",
    "adaptability", "attention to detail",
];

const DOMAIN_TERMS: &[&str] = &[
    "fintech", "healthcare", "e-commerce", "ecommerce", "banking", "insurance",
    "logistics", "gaming", "adtech", "edtech", "saas", "compliance", "security",
];

pub(crate) const ROLE_TITLES: &[&str] = &[
    "software engineer", "software developer", "backend engineer", "backend developer",
    "frontend engineer", "frontend developer", "full stack developer", "fullstack developer",
    "full stack engineer", "mobile developer", "android developer", "ios developer",
    "data scientist", "data engineer", "data analyst", "ml engineer",
    "machine learning engineer", "devops engineer", "site reliability engineer",
    "embedded engineer", "iot engineer", "qa engineer", "security engineer",
    "platform engineer", "cloud engineer",
];

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "your", "our", "are", "will", "have", "has",
    "this", "that", "from", "into", "able", "who", "what", "where", "when", "why",
    "how", "all", "any", "can", "must", "should", "would", "could", "them", "they",
    "their", "was", "were", "been", "being", "more", "most", "some", "such", "than",
    "then", "there", "these", "those", "too", "very", "about", "after", "before",
    "between", "both", "each", "other", "out", "over", "under", "while", "work",
    "working", "years", "year", "experience", "strong", "good", "great", "plus",
    "required", "preferred", "knowledge", "including", "etc", "within", "using",
    "use", "used", "well", "team", "teams", "role", "position", "candidate",
];

#[cfg(test)]
mod tests {
    use super::*;

    const JD: &str = "We are hiring a Backend Engineer.\n\
        Requirements:\n\
        - 3+ years of experience with Python and Django\n\
        - Must have knowledge of PostgreSQL and Redis\n\
        - Familiarity with Docker and Kubernetes is a plus\n\
        - Excellent communication skills\n";

    #[test]
    fn test_requirement_extraction() {
        let requirements = extract_requirements(JD);
        assert!(requirements.len() >= 4);

        let python_req = requirements
            .iter()
            .find(|r| r.keywords.iter().any(|k| k == "python"))
            .unwrap();
        assert_eq!(python_req.category, RequirementCategory::Technical);
        assert_eq!(python_req.priority, RequirementPriority::MustHave);
    }

    #[test]
    fn test_nice_to_have_priority() {
        let requirements = extract_requirements(JD);
        let docker_req = requirements
            .iter()
            .find(|r| r.text.to_lowercase().contains("docker"))
            .unwrap();
        assert_eq!(docker_req.priority, RequirementPriority::NiceToHave);
    }

    #[test]
    fn test_prose_jd_sentences_carry_their_own_priority() {
        let jd = "Must have Python, Django and PostgreSQL experience. \
                  Docker knowledge preferred.";
        let requirements = extract_requirements(jd);

        let python_req = requirements
            .iter()
            .find(|r| r.keywords.iter().any(|k| k == "python"))
            .unwrap();
        assert_eq!(python_req.priority, RequirementPriority::MustHave);

        let docker_req = requirements
            .iter()
            .find(|r| r.keywords.iter().any(|k| k == "docker"))
            .unwrap();
        assert_eq!(docker_req.priority, RequirementPriority::NiceToHave);
    }

    #[test]
    fn test_dotted_skill_names_survive_sentence_splitting() {
        let requirements = extract_requirements("Experience with node.js and express required.");
        assert_eq!(requirements.len(), 1);
        assert!(requirements[0].text.contains("node.js"));
    }

    #[test]
    fn test_soft_skill_category() {
        let requirements = extract_requirements(JD);
        let comm_req = requirements
            .iter()
            .find(|r| r.text.to_lowercase().contains("communication"))
            .unwrap();
        assert_eq!(comm_req.category, RequirementCategory::SoftSkill);
    }

    #[test]
    fn test_skill_scan_finds_known_skills() {
        let skills = find_known_skills(JD);
        assert!(skills.contains(&"python".to_string()));
        assert!(skills.contains(&"kubernetes".to_string()));
        assert!(skills.contains(&"postgresql".to_string()));
    }

    #[test]
    fn test_fresher_detection() {
        let config = crate::config::Config::default().scoring;
        assert!(detect_fresher(
            "Entry-level position, 0-1 years, freshers welcome",
            &config
        ));
        assert!(!detect_fresher(
            "Senior engineer, 8+ years required, freshers welcome",
            &config
        ));
        assert!(!detect_fresher("Backend engineer, 5 years experience", &config));
    }

    #[test]
    fn test_title_extraction() {
        let titles = find_titles("Looking for a backend engineer or software developer");
        assert!(titles.contains(&"backend engineer".to_string()));
        assert!(titles.contains(&"software developer".to_string()));
    }
}
