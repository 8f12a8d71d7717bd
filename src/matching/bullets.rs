//! Resume bullet extraction
//!
//! Bullets are the evidence units the hybrid matcher scores against job
//! requirements: bullet-marker lines, plus sentence-like lines long enough
//! to carry real content, each tagged by the section they came from.

use crate::model::resume::SectionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeBullet {
    pub text: String,
    pub section: Option<SectionId>,
}

/// Extract bullets from raw resume text, tracking the current section as
/// headers go by.
pub fn extract_bullets(resume_text: &str, min_sentence_chars: usize) -> Vec<ResumeBullet> {
    let mut bullets = Vec::new();
    let mut current_section: Option<SectionId> = None;

    for line in resume_text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(section) = detect_section_header(trimmed) {
            current_section = Some(section);
            continue;
        }

        let is_marker_line = trimmed.starts_with(['-', '*', '\u{2022}']);
        if is_marker_line {
            let text = trimmed
                .trim_start_matches(['-', '*', '\u{2022}'])
                .trim()
                .to_string();
            if !text.is_empty() {
                bullets.push(ResumeBullet {
                    text,
                    section: current_section,
                });
            }
            continue;
        }

        // Sentence-like lines count too, once they carry enough content
        if trimmed.chars().count() >= min_sentence_chars
            && trimmed.chars().any(|c| c.is_alphabetic())
        {
            bullets.push(ResumeBullet {
                text: trimmed.to_string(),
                section: current_section,
            });
        }
    }

    bullets
}

fn detect_section_header(line: &str) -> Option<SectionId> {
    let lower = line.to_lowercase();
    let lower = lower.trim_end_matches(':').trim();
    // Headers are short; a sentence mentioning "experience" is not one
    if lower.chars().count() > 32 {
        return None;
    }

    let table: [(&str, SectionId); 8] = [
        ("summary", SectionId::Summary),
        ("profile", SectionId::Summary),
        ("experience", SectionId::Experience),
        ("employment", SectionId::Experience),
        ("education", SectionId::Education),
        ("skills", SectionId::Skills),
        ("projects", SectionId::Projects),
        ("certifications", SectionId::Certifications),
    ];

    for (pattern, section) in table {
        if lower == pattern || lower.ends_with(pattern) || lower.starts_with(pattern) {
            return Some(section);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jane Smith\njane@example.com\n\n\
        Experience:\n\
        Software Engineer at Acme (2020-2024)\n\
        - Built REST APIs serving 2M requests per day\n\
        - Reduced deployment time by 60% with CI automation\n\n\
        Projects:\n\
        * Wrote an open source log parser in Rust\n\n\
        Skills:\n\
        Rust, Python, PostgreSQL\n";

    #[test]
    fn test_marker_bullets_are_extracted_with_section() {
        let bullets = extract_bullets(RESUME, 30);
        let api_bullet = bullets
            .iter()
            .find(|b| b.text.contains("REST APIs"))
            .unwrap();
        assert_eq!(api_bullet.section, Some(SectionId::Experience));

        let project_bullet = bullets
            .iter()
            .find(|b| b.text.contains("log parser"))
            .unwrap();
        assert_eq!(project_bullet.section, Some(SectionId::Projects));
    }

    #[test]
    fn test_long_sentence_lines_count_as_bullets() {
        let bullets = extract_bullets(RESUME, 30);
        assert!(bullets
            .iter()
            .any(|b| b.text.contains("Software Engineer at Acme")));
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let bullets = extract_bullets(RESUME, 30);
        assert!(!bullets.iter().any(|b| b.text == "Jane Smith"));
        assert!(!bullets.iter().any(|b| b.text.contains("jane@example.com")));
    }

    #[test]
    fn test_section_header_detection() {
        assert_eq!(detect_section_header("Experience:"), Some(SectionId::Experience));
        assert_eq!(detect_section_header("TECHNICAL SKILLS"), Some(SectionId::Skills));
        assert_eq!(
            detect_section_header("My experience with long sentences about work history"),
            None
        );
    }
}
