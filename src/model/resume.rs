//! Resume snapshot structures
//!
//! A `ResumeSnapshot` is an immutable value: pipeline steps never mutate one
//! in place, they produce a new version appended to the session history.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSnapshot {
    pub contact: ContactInfo,
    pub summary: Option<String>,
    pub experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub skills: Vec<SkillGroup>,
    pub certifications: Vec<String>,
    /// Original file name, when the resume came from an upload.
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub role: String,
    pub company: String,
    pub date_range: Option<String>,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub bullets: Vec<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    pub items: Vec<String>,
}

/// Closed set of resume sections the parser and the pipeline talk about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Contact,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
}

impl SectionId {
    pub const ALL: [SectionId; 7] = [
        SectionId::Contact,
        SectionId::Summary,
        SectionId::Experience,
        SectionId::Education,
        SectionId::Skills,
        SectionId::Projects,
        SectionId::Certifications,
    ];
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SectionId::Contact => "Contact",
            SectionId::Summary => "Summary",
            SectionId::Experience => "Experience",
            SectionId::Education => "Education",
            SectionId::Skills => "Skills",
            SectionId::Projects => "Projects",
            SectionId::Certifications => "Certifications",
        };
        write!(f, "{}", name)
    }
}

impl ResumeSnapshot {
    pub fn empty() -> Self {
        Self {
            contact: ContactInfo::default(),
            summary: None,
            experience: Vec::new(),
            education: Vec::new(),
            projects: Vec::new(),
            skills: Vec::new(),
            certifications: Vec::new(),
            file_name: None,
        }
    }

    pub fn has_section(&self, section: SectionId) -> bool {
        match section {
            SectionId::Contact => {
                self.contact.name.is_some()
                    || self.contact.email.is_some()
                    || self.contact.phone.is_some()
            }
            SectionId::Summary => self
                .summary
                .as_ref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false),
            SectionId::Experience => !self.experience.is_empty(),
            SectionId::Education => !self.education.is_empty(),
            SectionId::Skills => self.skills.iter().any(|g| !g.items.is_empty()),
            SectionId::Projects => !self.projects.is_empty(),
            SectionId::Certifications => !self.certifications.is_empty(),
        }
    }

    pub fn missing_sections(&self) -> Vec<SectionId> {
        SectionId::ALL
            .iter()
            .copied()
            .filter(|s| !self.has_section(*s))
            .collect()
    }

    /// All bullet lines across experience and projects, tagged by section.
    pub fn tagged_bullets(&self) -> Vec<(SectionId, String)> {
        let mut bullets = Vec::new();
        for exp in &self.experience {
            for b in &exp.bullets {
                bullets.push((SectionId::Experience, b.clone()));
            }
        }
        for project in &self.projects {
            for b in &project.bullets {
                bullets.push((SectionId::Projects, b.clone()));
            }
        }
        bullets
    }

    pub fn all_skills(&self) -> Vec<String> {
        self.skills
            .iter()
            .flat_map(|g| g.items.iter().cloned())
            .collect()
    }

    /// Render the canonical plain-text form consumed by the scoring
    /// primitives. Deterministic: the same snapshot always renders the
    /// same text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        if let Some(name) = &self.contact.name {
            out.push_str(name);
            out.push('\n');
        }
        if let Some(email) = &self.contact.email {
            out.push_str(email);
            out.push('\n');
        }
        if let Some(phone) = &self.contact.phone {
            out.push_str(phone);
            out.push('\n');
        }
        if let Some(location) = &self.contact.location {
            out.push_str(location);
            out.push('\n');
        }
        for link in &self.contact.links {
            out.push_str(link);
            out.push('\n');
        }

        if let Some(summary) = &self.summary {
            out.push_str("\nSummary:\n");
            out.push_str(summary);
            out.push('\n');
        }

        if !self.experience.is_empty() {
            out.push_str("\nExperience:\n");
            for exp in &self.experience {
                out.push_str(&format!("{} at {}", exp.role, exp.company));
                if let Some(range) = &exp.date_range {
                    out.push_str(&format!(" ({})", range));
                }
                out.push('\n');
                for b in &exp.bullets {
                    out.push_str(&format!("- {}\n", b));
                }
            }
        }

        if !self.projects.is_empty() {
            out.push_str("\nProjects:\n");
            for project in &self.projects {
                out.push_str(&project.title);
                if let Some(link) = &project.link {
                    out.push_str(&format!(" ({})", link));
                }
                out.push('\n');
                for b in &project.bullets {
                    out.push_str(&format!("- {}\n", b));
                }
            }
        }

        if !self.education.is_empty() {
            out.push_str("\nEducation:\n");
            for edu in &self.education {
                out.push_str(&format!("{}, {}", edu.degree, edu.institution));
                if let Some(year) = &edu.year {
                    out.push_str(&format!(" ({})", year));
                }
                out.push('\n');
            }
        }

        if self.skills.iter().any(|g| !g.items.is_empty()) {
            out.push_str("\nSkills:\n");
            for group in &self.skills {
                out.push_str(&format!("{}: {}\n", group.category, group.items.join(", ")));
            }
        }

        if !self.certifications.is_empty() {
            out.push_str("\nCertifications:\n");
            for cert in &self.certifications {
                out.push_str(&format!("- {}\n", cert));
            }
        }

        out
    }
}
