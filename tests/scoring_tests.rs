//! End-to-end scoring tests through the public API

use resume_optimizer::config::Config;
use resume_optimizer::model::resume::{
    ContactInfo, Education, Project, ResumeSnapshot, SkillGroup, WorkExperience,
};
use resume_optimizer::scoring::engine::ScoringEngine;
use resume_optimizer::scoring::gaps::analyze_gaps;
use resume_optimizer::scoring::parameters::ScoreParameter;
use resume_optimizer::scoring::tiers::Tier;

fn engine() -> ScoringEngine {
    ScoringEngine::new(Config::default().scoring)
}

fn backend_resume() -> ResumeSnapshot {
    let mut snapshot = ResumeSnapshot::empty();
    snapshot.contact = ContactInfo {
        name: Some("Jane Smith".to_string()),
        email: Some("jane@example.com".to_string()),
        phone: Some("555-0100".to_string()),
        location: Some("Austin, TX".to_string()),
        links: vec!["github.com/janesmith".to_string()],
    };
    snapshot.summary = Some(
        "Backend engineer with four years building python services and postgresql data layers"
            .to_string(),
    );
    snapshot.experience = vec![WorkExperience {
        role: "Backend Engineer".to_string(),
        company: "Acme".to_string(),
        date_range: Some("2020-2024".to_string()),
        bullets: vec![
            "Built python REST APIs serving 2M requests per day".to_string(),
            "Reduced query latency by 45% by tuning postgresql indexes".to_string(),
            "Led migration to docker-based deployments across 12 services".to_string(),
        ],
    }];
    snapshot.education = vec![Education {
        degree: "BSc Computer Science".to_string(),
        institution: "State University".to_string(),
        year: Some("2020".to_string()),
    }];
    snapshot.projects = vec![Project {
        title: "Open source job queue".to_string(),
        bullets: vec!["Wrote a persistent task queue in python with retry semantics".to_string()],
        link: Some("github.com/janesmith/queue".to_string()),
    }];
    snapshot.skills = vec![SkillGroup {
        category: "Technical".to_string(),
        items: vec![
            "Python".to_string(),
            "PostgreSQL".to_string(),
            "Docker".to_string(),
            "Redis".to_string(),
        ],
    }];
    snapshot
}

fn chef_resume() -> ResumeSnapshot {
    let mut snapshot = ResumeSnapshot::empty();
    snapshot.contact = ContactInfo {
        name: Some("Pat Jones".to_string()),
        email: Some("pat@example.com".to_string()),
        ..Default::default()
    };
    snapshot.summary = Some("Head chef with a decade of fine dining kitchens".to_string());
    snapshot.experience = vec![WorkExperience {
        role: "Head Chef".to_string(),
        company: "Bistro Lumiere".to_string(),
        date_range: Some("2015-2024".to_string()),
        bullets: vec![
            "Managed a brigade of 14 cooks across two services".to_string(),
            "Designed seasonal menus raising covers by 30%".to_string(),
        ],
    }];
    snapshot.skills = vec![SkillGroup {
        category: "Culinary".to_string(),
        items: vec!["Pastry".to_string(), "Menu design".to_string()],
    }];
    snapshot
}

const BACKEND_JD: &str = "We are hiring a Backend Engineer.\n\
    Requirements:\n\
    - Must have 3+ years experience with Python and PostgreSQL\n\
    - Experience with Docker and Redis\n\
    - Knowledge of REST API design\n\
    - Strong communication skills\n";

#[test]
fn tier_weights_sum_to_100_in_both_modes() {
    for fresher in [false, true] {
        let sum: u32 = Tier::ALL.iter().map(|t| t.weight(fresher)).sum();
        assert_eq!(sum, 100, "fresher={}", fresher);
    }
}

#[test]
fn parameter_scores_never_exceed_their_maxima() {
    let engine = engine();
    for (resume, jd) in [
        (backend_resume(), Some(BACKEND_JD)),
        (backend_resume(), None),
        (chef_resume(), Some(BACKEND_JD)),
        (ResumeSnapshot::empty(), Some(BACKEND_JD)),
    ] {
        let text = resume.to_text();
        let score = engine.calculate_score(&text, Some(&resume), jd);
        assert_eq!(score.parameters.len(), 16);
        for param in &score.parameters {
            assert!(
                param.score <= param.max,
                "{:?}: {} > {}",
                param.parameter,
                param.score,
                param.max
            );
            assert_eq!(param.max, param.parameter.max_points());
        }
        assert!(score.overall_score <= 100);
        assert!(score.ats_score <= 100);
    }
}

#[test]
fn parameter_maxima_sum_to_138() {
    let sum: u32 = ScoreParameter::ALL.iter().map(|p| p.max_points()).sum();
    assert_eq!(sum, 138);
}

#[test]
fn full_analysis_is_deterministic_across_runs() {
    let engine = engine();
    let resume = backend_resume();
    let text = resume.to_text();

    let first = analyze_gaps(&engine, Some(&resume), &text, Some(BACKEND_JD));
    for _ in 0..2 {
        let again = analyze_gaps(&engine, Some(&resume), &text, Some(BACKEND_JD));
        assert_eq!(first.score, again.score);
        assert_eq!(first.prioritized_improvements, again.prioritized_improvements);
        assert_eq!(first.missing_keywords, again.missing_keywords);
    }
}

#[test]
fn aligned_resume_outscores_mismatched_resume() {
    let engine = engine();
    let aligned = backend_resume();
    let mismatched = chef_resume();

    let aligned_score =
        engine.calculate_score(&aligned.to_text(), Some(&aligned), Some(BACKEND_JD));
    let mismatched_score =
        engine.calculate_score(&mismatched.to_text(), Some(&mismatched), Some(BACKEND_JD));

    assert!(
        aligned_score.overall_score > mismatched_score.overall_score,
        "aligned {} vs mismatched {}",
        aligned_score.overall_score,
        mismatched_score.overall_score
    );
}

#[test]
fn domain_mismatch_caps_keyword_parameters() {
    let engine = engine();
    let resume = chef_resume();
    let text = resume.to_text();
    let score = engine.calculate_score(&text, Some(&resume), Some(BACKEND_JD));
    assert!(score.jd_mode);

    // A kitchen resume against a backend JD matches almost none of the
    // keywords, so the capped parameters sit at or under half their maxima
    for parameter in [
        ScoreParameter::KeywordMatch,
        ScoreParameter::SkillsAlignment,
        ScoreParameter::ExperienceRelevance,
    ] {
        let param = score
            .parameters
            .iter()
            .find(|p| p.parameter == parameter)
            .unwrap();
        let cap = (param.max as f32 * 0.50).floor() as u32;
        assert!(
            param.score <= cap,
            "{:?} scored {} above cap {}",
            parameter,
            param.score,
            cap
        );
    }
}

#[test]
fn fresher_posting_redistributes_tier_weights() {
    let engine = engine();
    let mut resume = ResumeSnapshot::empty();
    resume.contact = ContactInfo {
        name: Some("Priya Patel".to_string()),
        email: Some("priya@example.com".to_string()),
        ..Default::default()
    };
    resume.education = vec![Education {
        degree: "BTech Computer Science".to_string(),
        institution: "National Institute".to_string(),
        year: Some("2025".to_string()),
    }];
    resume.skills = vec![SkillGroup {
        category: "Technical".to_string(),
        items: vec!["Python".to_string(), "SQL".to_string()],
    }];
    let text = resume.to_text();
    let jd = "Entry-level python developer position for recent graduates. \
              0-1 years experience. SQL knowledge required.";

    let score = engine.calculate_score(&text, Some(&resume), Some(jd));
    assert!(score.fresher);

    let weight_of = |tier: Tier| score.tiers.iter().find(|t| t.tier == tier).unwrap().weight;
    assert_eq!(weight_of(Tier::Experience), 8);
    assert_eq!(weight_of(Tier::SkillsKeywords), 28);
    assert_eq!(weight_of(Tier::Education), 15);
    assert_eq!(weight_of(Tier::Projects), 13);

    // No experience section, but the fresher floor keeps the tier healthy
    let experience = score.tiers.iter().find(|t| t.tier == Tier::Experience).unwrap();
    assert!(experience.percentage >= 70.0);
}

#[test]
fn gap_analysis_flags_missing_must_have_skills() {
    let engine = engine();
    let mut resume = backend_resume();
    // Remove docker and redis so they become gaps
    resume.skills = vec![SkillGroup {
        category: "Technical".to_string(),
        items: vec!["Python".to_string()],
    }];
    resume.experience[0].bullets.retain(|b| !b.contains("docker"));
    resume.experience[0].bullets.retain(|b| !b.contains("postgresql"));

    let text = resume.to_text();
    let result = analyze_gaps(&engine, Some(&resume), &text, Some(BACKEND_JD));

    let all_missing: Vec<&String> = result
        .missing_keywords
        .critical
        .iter()
        .chain(result.missing_keywords.important.iter())
        .collect();
    assert!(
        all_missing.iter().any(|k| k.as_str() == "docker"),
        "missing: {:?}",
        all_missing
    );
    assert!(!result.prioritized_improvements.is_empty());
    assert!(result.top_improvements(5).len() <= 5);
}
