//! Renders a gap-analysis result for humans and spreadsheets

use crate::scoring::engine::ComprehensiveScore;
use crate::scoring::gaps::GapAnalysisResult;
use colored::Colorize;
use std::fmt::Write;

/// Markdown report: overall verdict, tier breakdown, top improvements and
/// missing keywords by severity.
pub fn markdown_report(analysis: &GapAnalysisResult) -> String {
    let score = &analysis.score;
    let mut out = String::new();

    let _ = writeln!(out, "# Resume Analysis Report\n");
    let _ = writeln!(
        out,
        "**Overall Score:** {}/100 ({})",
        score.overall_score,
        score.match_quality.label()
    );
    let _ = writeln!(out, "**ATS Score:** {}/100", score.ats_score);
    let _ = writeln!(out, "**Interview Chance:** {}", score.interview_chance);
    let mode = if score.jd_mode {
        "job description"
    } else {
        "general best practices"
    };
    let _ = writeln!(out, "**Scored against:** {}\n", mode);

    let _ = writeln!(out, "## Tier Breakdown\n");
    let _ = writeln!(out, "| Tier | Score | Weight | % |");
    let _ = writeln!(out, "|------|-------|--------|---|");
    for tier in &score.tiers {
        let _ = writeln!(
            out,
            "| {} | {:.1}/{:.1} | {} | {:.0}% |",
            tier.tier.label(),
            tier.score,
            tier.max,
            tier.weight,
            tier.percentage
        );
    }
    out.push('\n');

    let _ = writeln!(out, "## Critical Metrics\n");
    for metric in &score.critical_metrics {
        let _ = writeln!(
            out,
            "- **{}**: {}/{} ({:.0}%)",
            metric.metric.label(),
            metric.score,
            metric.max,
            metric.percentage
        );
    }
    out.push('\n');

    let top = analysis.top_improvements(5);
    if !top.is_empty() {
        let _ = writeln!(out, "## Top Improvements\n");
        for (i, improvement) in top.iter().enumerate() {
            let _ = writeln!(out, "{}. **{}**", i + 1, improvement.title);
            for action in &improvement.actions {
                let _ = writeln!(out, "   - {}", action);
            }
        }
        out.push('\n');
    }

    let missing = &analysis.missing_keywords;
    if !missing.critical.is_empty() || !missing.important.is_empty() || !missing.optional.is_empty()
    {
        let _ = writeln!(out, "## Missing Keywords\n");
        if !missing.critical.is_empty() {
            let _ = writeln!(out, "- **Critical:** {}", missing.critical.join(", "));
        }
        if !missing.important.is_empty() {
            let _ = writeln!(out, "- **Important:** {}", missing.important.join(", "));
        }
        if !missing.optional.is_empty() {
            let _ = writeln!(out, "- **Optional:** {}", missing.optional.join(", "));
        }
    }

    out
}

/// CSV with one row per scoring parameter, then tiers and critical
/// metrics, for spreadsheet analysis across many resumes.
pub fn csv_report(score: &ComprehensiveScore) -> String {
    let mut out = String::from("kind,name,score,max,percentage\n");

    for param in &score.parameters {
        let pct = if param.max == 0 {
            0.0
        } else {
            param.score as f32 / param.max as f32 * 100.0
        };
        let _ = writeln!(
            out,
            "parameter,{},{},{},{:.1}",
            param.parameter.name(),
            param.score,
            param.max,
            pct
        );
    }
    for tier in &score.tiers {
        let _ = writeln!(
            out,
            "tier,{},{:.1},{:.1},{:.1}",
            tier.tier.name(),
            tier.score,
            tier.max,
            tier.percentage
        );
    }
    for metric in &score.critical_metrics {
        let _ = writeln!(
            out,
            "critical_metric,{},{},{},{:.1}",
            metric.metric.name(),
            metric.score,
            metric.max,
            metric.percentage
        );
    }
    let _ = writeln!(out, "summary,overall_score,{},100,", score.overall_score);
    let _ = writeln!(out, "summary,ats_score,{},100,", score.ats_score);

    out
}

/// Colored terminal report. With `color` off the same text renders plain.
pub fn console_report(analysis: &GapAnalysisResult, color: bool) -> String {
    colored::control::set_override(color);
    let score = &analysis.score;
    let mut out = String::new();

    let overall = format!("{}/100", score.overall_score);
    let overall = match score.overall_score {
        70.. => overall.green().bold(),
        45..=69 => overall.yellow().bold(),
        _ => overall.red().bold(),
    };
    let _ = writeln!(out, "\n{} {}", "Overall Score:".bold(), overall);
    let _ = writeln!(
        out,
        "{} {} (interview chance {})",
        "Match Quality:".bold(),
        score.match_quality.label(),
        score.interview_chance
    );
    let _ = writeln!(out, "{} {}/100\n", "ATS Score:".bold(), score.ats_score);

    let _ = writeln!(out, "{}", "Tier Breakdown".bold().underline());
    for tier in &score.tiers {
        let pct = format!("{:>3.0}%", tier.percentage);
        let pct = if tier.percentage < 50.0 {
            pct.red()
        } else if tier.percentage < 70.0 {
            pct.yellow()
        } else {
            pct.green()
        };
        let _ = writeln!(
            out,
            "  {:<22} {}  (weight {})",
            tier.tier.label(),
            pct,
            tier.weight
        );
    }

    let top = analysis.top_improvements(5);
    if !top.is_empty() {
        let _ = writeln!(out, "\n{}", "Top Improvements".bold().underline());
        for (i, improvement) in top.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, improvement.title);
        }
    }

    let missing = &analysis.missing_keywords;
    if !missing.critical.is_empty() {
        let _ = writeln!(
            out,
            "\n{} {}",
            "Missing critical keywords:".red().bold(),
            missing.critical.join(", ")
        );
    }

    colored::control::unset_override();
    out
}
