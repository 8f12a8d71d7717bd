//! External collaborator seams for the pipeline
//!
//! Parsing, bullet rewriting, and project suggestions are pluggable: the
//! controller only speaks these traits. Each trait ships with a built-in
//! offline implementation so the full pipeline runs without network access
//! or model weights. Rewriters return raw JSON and the controller
//! validates the schema, so a misbehaving backend cannot corrupt a resume
//! version.

use crate::error::{Result, ResumeOptimizerError};
use crate::model::resume::{
    ContactInfo, Education, Project, ResumeSnapshot, SectionId, SkillGroup, WorkExperience,
};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedResume {
    pub snapshot: ResumeSnapshot,
    pub missing_sections: Vec<SectionId>,
    /// Parser self-assessment in [0, 1]; low confidence is logged, not fatal.
    pub confidence: f32,
}

#[async_trait]
pub trait ResumeParser: Send + Sync {
    async fn parse(&self, resume_text: &str) -> Result<ParsedResume>;
}

/// Rewrites resume bullets toward the job's language. Returns raw JSON of
/// the shape `{"bullets": ["...", ...]}`; the controller validates it.
#[async_trait]
pub trait BulletRewriter: Send + Sync {
    async fn rewrite(&self, bullets: &[String], job_description: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSuggestion {
    pub title: String,
    pub url: Option<String>,
    pub description: String,
}

#[async_trait]
pub trait ProjectCatalog: Send + Sync {
    /// Suggest projects aligned with the role. Implementations may consult
    /// an external index; failures should fall back to the built-in set.
    async fn suggest(&self, role: RoleClass, limit: usize) -> Result<Vec<ProjectSuggestion>>;
}

/// Coarse role classification used to pick project suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleClass {
    Backend,
    Frontend,
    Fullstack,
    Mobile,
    Data,
    Embedded,
    Iot,
}

impl RoleClass {
    /// Classify from job-description text. First match in priority order
    /// wins; a text that names nothing defaults to backend.
    pub fn classify(jd_text: &str) -> Self {
        let lower = jd_text.to_lowercase();
        let table: [(&str, RoleClass); 13] = [
            ("full stack", RoleClass::Fullstack),
            ("fullstack", RoleClass::Fullstack),
            ("frontend", RoleClass::Frontend),
            ("front-end", RoleClass::Frontend),
            ("mobile", RoleClass::Mobile),
            ("android", RoleClass::Mobile),
            ("ios", RoleClass::Mobile),
            ("iot", RoleClass::Iot),
            ("embedded", RoleClass::Embedded),
            ("firmware", RoleClass::Embedded),
            ("data scientist", RoleClass::Data),
            ("data engineer", RoleClass::Data),
            ("machine learning", RoleClass::Data),
        ];
        for (needle, class) in table {
            if lower.contains(needle) {
                return class;
            }
        }
        RoleClass::Backend
    }
}

// --- Built-in offline implementations ---

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("invalid email regex")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+?\d[\d\s().-]{7,}\d").expect("invalid phone regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(https?://\S+|(github|linkedin)\.com/\S+)").expect("invalid url regex")
    })
}

fn role_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<role>[^,|@]+?)\s+(?:at|@|\||,)\s+(?P<company>[^(|]+?)\s*(?:\((?P<range>[^)]+)\))?\s*$").expect("invalid role line regex")
    })
}

/// Line-oriented heuristic parser: splits on recognized section headers
/// and interprets each block. Good enough for plain-text resumes; PDF and
/// DOCX extraction happens upstream.
pub struct HeuristicResumeParser;

#[async_trait]
impl ResumeParser for HeuristicResumeParser {
    async fn parse(&self, resume_text: &str) -> Result<ParsedResume> {
        if resume_text.trim().is_empty() {
            return Err(ResumeOptimizerError::Parsing(
                "resume text is empty".to_string(),
            ));
        }

        let mut snapshot = ResumeSnapshot::empty();
        let mut current: Option<SectionId> = None;
        let mut preamble: Vec<&str> = Vec::new();

        for line in resume_text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(section) = section_header(trimmed) {
                current = Some(section);
                continue;
            }

            match current {
                None => preamble.push(trimmed),
                Some(SectionId::Summary) => {
                    let summary = snapshot.summary.get_or_insert_with(String::new);
                    if !summary.is_empty() {
                        summary.push(' ');
                    }
                    summary.push_str(trimmed);
                }
                Some(SectionId::Experience) => parse_experience_line(&mut snapshot, trimmed),
                Some(SectionId::Education) => parse_education_line(&mut snapshot, trimmed),
                Some(SectionId::Projects) => parse_project_line(&mut snapshot, trimmed),
                Some(SectionId::Skills) => parse_skills_line(&mut snapshot, trimmed),
                Some(SectionId::Certifications) => {
                    let text = strip_marker(trimmed);
                    if !text.is_empty() {
                        snapshot.certifications.push(text);
                    }
                }
                Some(SectionId::Contact) => parse_contact_line(&mut snapshot.contact, trimmed),
            }
        }

        parse_preamble(&mut snapshot.contact, &preamble);

        let missing_sections = snapshot.missing_sections();
        // Confidence: fraction of sections found, contact weighted like any other
        let confidence =
            (SectionId::ALL.len() - missing_sections.len()) as f32 / SectionId::ALL.len() as f32;

        Ok(ParsedResume {
            snapshot,
            missing_sections,
            confidence,
        })
    }
}

fn section_header(line: &str) -> Option<SectionId> {
    let lower = line.to_lowercase();
    let lower = lower.trim_end_matches(':').trim();
    if lower.chars().count() > 32 {
        return None;
    }
    let table: [(&str, SectionId); 10] = [
        ("summary", SectionId::Summary),
        ("profile", SectionId::Summary),
        ("objective", SectionId::Summary),
        ("experience", SectionId::Experience),
        ("employment", SectionId::Experience),
        ("education", SectionId::Education),
        ("skills", SectionId::Skills),
        ("projects", SectionId::Projects),
        ("certifications", SectionId::Certifications),
        ("contact", SectionId::Contact),
    ];
    for (pattern, section) in table {
        if lower == pattern || lower.ends_with(pattern) || lower.starts_with(pattern) {
            return Some(section);
        }
    }
    None
}

fn strip_marker(line: &str) -> String {
    line.trim_start_matches(['-', '*', '\u{2022}']).trim().to_string()
}

fn is_marker_line(line: &str) -> bool {
    line.starts_with(['-', '*', '\u{2022}'])
}

fn parse_experience_line(snapshot: &mut ResumeSnapshot, line: &str) {
    if is_marker_line(line) {
        let bullet = strip_marker(line);
        if let Some(last) = snapshot.experience.last_mut() {
            if !bullet.is_empty() {
                last.bullets.push(bullet);
            }
            return;
        }
        // Bullet before any role line: synthesize an entry
        snapshot.experience.push(WorkExperience {
            role: "Unknown".to_string(),
            company: "Unknown".to_string(),
            date_range: None,
            bullets: vec![bullet],
        });
        return;
    }

    if let Some(caps) = role_line_re().captures(line) {
        snapshot.experience.push(WorkExperience {
            role: caps["role"].trim().to_string(),
            company: caps["company"].trim().to_string(),
            date_range: caps.name("range").map(|m| m.as_str().trim().to_string()),
            bullets: Vec::new(),
        });
    } else if let Some(last) = snapshot.experience.last_mut() {
        // Continuation prose attaches to the current role
        last.bullets.push(line.to_string());
    }
}

fn parse_education_line(snapshot: &mut ResumeSnapshot, line: &str) {
    let text = strip_marker(line);
    if text.is_empty() {
        return;
    }
    let year_re: &Regex = {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("invalid year regex"))
    };
    let year = year_re.find(&text).map(|m| m.as_str().to_string());
    let (degree, institution) = match text.split_once(',') {
        Some((d, i)) => (d.trim().to_string(), i.trim().to_string()),
        None => (text.clone(), String::new()),
    };
    snapshot.education.push(Education {
        degree,
        institution,
        year,
    });
}

fn parse_project_line(snapshot: &mut ResumeSnapshot, line: &str) {
    if is_marker_line(line) {
        let bullet = strip_marker(line);
        if let Some(last) = snapshot.projects.last_mut() {
            if !bullet.is_empty() {
                last.bullets.push(bullet);
            }
            return;
        }
        snapshot.projects.push(Project {
            title: bullet,
            bullets: Vec::new(),
            link: None,
        });
        return;
    }

    let link = url_re().find(line).map(|m| {
        m.as_str()
            .trim_end_matches([')', ',', '.'])
            .to_string()
    });
    let title = url_re().replace_all(line, "").trim_end_matches(['(', ' ']).trim().to_string();
    snapshot.projects.push(Project {
        title: if title.is_empty() { line.to_string() } else { title },
        bullets: Vec::new(),
        link,
    });
}

fn parse_skills_line(snapshot: &mut ResumeSnapshot, line: &str) {
    let text = strip_marker(line);
    let (category, items_text) = match text.split_once(':') {
        Some((c, rest)) => (c.trim().to_string(), rest),
        None => ("General".to_string(), text.as_str()),
    };
    let items: Vec<String> = items_text
        .split([',', ';', '|', '\u{2022}'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }
    if let Some(group) = snapshot.skills.iter_mut().find(|g| g.category == category) {
        group.items.extend(items);
    } else {
        snapshot.skills.push(SkillGroup { category, items });
    }
}

fn parse_contact_line(contact: &mut ContactInfo, line: &str) {
    if let Some(m) = email_re().find(line) {
        contact.email.get_or_insert_with(|| m.as_str().to_string());
    } else if let Some(m) = url_re().find(line) {
        contact.links.push(m.as_str().to_string());
    } else if let Some(m) = phone_re().find(line) {
        contact.phone.get_or_insert_with(|| m.as_str().to_string());
    } else if contact.name.is_none() {
        contact.name = Some(line.to_string());
    }
}

/// The first lines before any header usually hold name and contact info.
fn parse_preamble(contact: &mut ContactInfo, lines: &[&str]) {
    for line in lines {
        parse_contact_line(contact, line);
    }
}

/// Offline rewriter: leads each bullet with an action verb and appends a
/// missing job keyword where one fits. Emits the same JSON contract a
/// model-backed rewriter would.
pub struct TemplateBulletRewriter;

#[derive(Serialize)]
struct RewriteEnvelope {
    bullets: Vec<String>,
}

#[async_trait]
impl BulletRewriter for TemplateBulletRewriter {
    async fn rewrite(&self, bullets: &[String], job_description: &str) -> Result<String> {
        let jd_skills = crate::model::job::find_known_skills(job_description);
        let rewritten: Vec<String> = bullets
            .iter()
            .map(|b| rewrite_one(b, &jd_skills))
            .collect();
        Ok(serde_json::to_string(&RewriteEnvelope { bullets: rewritten })?)
    }
}

fn rewrite_one(bullet: &str, jd_skills: &[String]) -> String {
    let mut text = bullet.trim().to_string();

    if !crate::scoring::parameters::starts_with_action_verb(&text) {
        text = match text.get(..1) {
            Some(first) => format!("Delivered {}{}", first.to_lowercase(), &text[1..]),
            None => text,
        };
    }

    // Weave in the first JD skill the bullet doesn't already mention
    let lower = text.to_lowercase();
    if let Some(skill) = jd_skills.iter().find(|s| !lower.contains(s.as_str())) {
        text = format!("{} using {}", text.trim_end_matches('.'), skill);
    }
    text
}

/// Built-in project catalog, keyed by role class. Serves as both the
/// default catalog and the fallback when an external catalog fails.
pub struct BuiltinProjectCatalog;

#[async_trait]
impl ProjectCatalog for BuiltinProjectCatalog {
    async fn suggest(&self, role: RoleClass, limit: usize) -> Result<Vec<ProjectSuggestion>> {
        Ok(builtin_suggestions(role)
            .into_iter()
            .take(limit)
            .collect())
    }
}

pub fn builtin_suggestions(role: RoleClass) -> Vec<ProjectSuggestion> {
    let entries: &[(&str, &str)] = match role {
        RoleClass::Backend => &[
            ("URL shortener with analytics", "REST API with rate limiting, caching, and click analytics backed by PostgreSQL and Redis"),
            ("Job queue service", "Persistent task queue with retries, dead-letter handling, and a worker pool"),
            ("Inventory management API", "CRUD service with authentication, role-based access, and audit logging"),
        ],
        RoleClass::Frontend => &[
            ("Kanban board", "Drag-and-drop task board with optimistic updates and offline support"),
            ("Data dashboard", "Charting dashboard with live filtering and responsive layout"),
            ("Component library", "Accessible, themeable UI component kit with visual regression tests"),
        ],
        RoleClass::Fullstack => &[
            ("Expense tracker", "Full-stack budgeting app with authentication, charts, and CSV export"),
            ("Event booking platform", "Listings, seat selection, and payment-flow integration end to end"),
            ("Realtime chat", "WebSocket chat with presence, typing indicators, and message history"),
        ],
        RoleClass::Mobile => &[
            ("Habit tracker", "Offline-first mobile app with local notifications and streak tracking"),
            ("Recipe finder", "Camera-based ingredient capture with API-backed recipe search"),
            ("Fitness logger", "Workout logging with charts, widgets, and wearable sync"),
        ],
        RoleClass::Data => &[
            ("Churn prediction pipeline", "Feature engineering, model training, and evaluation on a public dataset"),
            ("ETL workflow", "Scheduled ingestion pipeline with data quality checks and lineage"),
            ("A/B test analyzer", "Statistical significance tooling with visual experiment reports"),
        ],
        RoleClass::Embedded => &[
            ("Sensor data logger", "Low-power firmware logging to flash with a serial CLI"),
            ("Motor controller", "PID control loop with encoder feedback and safety cutoffs"),
            ("Bootloader", "Firmware update over UART with integrity verification"),
        ],
        RoleClass::Iot => &[
            ("Home climate monitor", "ESP32 sensor mesh publishing over MQTT to a live dashboard"),
            ("Smart irrigation", "Soil-moisture-driven watering with remote overrides and schedules"),
            ("Asset tracker", "GPS + LTE tracker with geofence alerts and a fleet map"),
        ],
    };

    entries
        .iter()
        .map(|(title, description)| ProjectSuggestion {
            title: title.to_string(),
            url: None,
            description: description.to_string(),
        })
        .collect()
}
