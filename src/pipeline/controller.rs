//! Pipeline controller: drives the 8 steps, retries, and persistence
//!
//! The controller owns the session context and persists it after every
//! step execution, so a crash at any point resumes from the last saved
//! state. Failures are retried per the error kind's recovery strategy;
//! once the budget is spent the step is marked failed and the session
//! waits for the user. Completed steps are never re-run implicitly.

use crate::config::Config;
use crate::error::{ErrorKind, Result, ResumeOptimizerError};
use crate::matching::bullets::ResumeBullet;
use crate::matching::embeddings::EmbeddingProvider;
use crate::matching::hybrid::HybridMatcher;
use crate::model::job::JobProfile;
use crate::model::resume::{Project, ResumeSnapshot, SectionId, SkillGroup, WorkExperience};
use crate::pipeline::collaborators::{
    BulletRewriter, ProjectCatalog, ProjectSuggestion, ResumeParser, RoleClass,
};
use crate::pipeline::context::{PipelineExecutionContext, ProgressIndicator};
use crate::pipeline::recovery::strategy_for;
use crate::pipeline::step::PipelineStep;
use crate::pipeline::store::{KeyValueStore, SessionStore};
use crate::scoring::engine::ScoringEngine;
use crate::scoring::gaps::analyze_gaps_with_profile;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Per-call input to `execute_step`. Most steps need none of it; the two
/// interactive steps read their answers from here. `None` means the user
/// has not answered yet; `Some(empty)` is an explicit decline.
#[derive(Debug, Clone, Default)]
pub struct StepInput {
    pub resume_text: Option<String>,
    pub provided_sections: Option<Vec<(SectionId, String)>>,
    pub approved_projects: Option<Vec<ProjectSuggestion>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step: PipelineStep,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub next_step: Option<PipelineStep>,
    pub user_input_required: bool,
    pub progress: ProgressIndicator,
}

enum StepOutcome {
    Done(serde_json::Value),
    NeedsInput(serde_json::Value),
}

pub struct PipelineController<S: KeyValueStore> {
    config: Config,
    engine: ScoringEngine,
    store: SessionStore<S>,
    parser: Box<dyn ResumeParser>,
    rewriter: Box<dyn BulletRewriter>,
    catalog: Box<dyn ProjectCatalog>,
    embedder: Box<dyn EmbeddingProvider>,
    context: PipelineExecutionContext,
    job_profile: Option<JobProfile>,
}

impl<S: KeyValueStore> PipelineController<S> {
    /// Start a new session. The job profile is extracted once here and
    /// reused by every analysis step.
    #[allow(clippy::too_many_arguments)]
    pub fn new_session(
        config: Config,
        backend: S,
        parser: Box<dyn ResumeParser>,
        rewriter: Box<dyn BulletRewriter>,
        catalog: Box<dyn ProjectCatalog>,
        embedder: Box<dyn EmbeddingProvider>,
        user_id: &str,
        job_description: &str,
        target_role: Option<String>,
    ) -> Result<Self> {
        let store = SessionStore::new(
            backend,
            config.pipeline.max_sessions,
            config.pipeline.max_session_age_hours,
        );
        let context = PipelineExecutionContext::new(user_id, job_description, target_role);
        store.save(&context)?;
        info!("started session {}", context.session_id);

        let job_profile = extract_profile(&config, job_description);
        Ok(Self {
            engine: ScoringEngine::new(config.scoring.clone()),
            config,
            store,
            parser,
            rewriter,
            catalog,
            embedder,
            context,
            job_profile,
        })
    }

    /// Resume a persisted session. Refuses sessions past the age limit.
    #[allow(clippy::too_many_arguments)]
    pub fn resume_session(
        config: Config,
        backend: S,
        parser: Box<dyn ResumeParser>,
        rewriter: Box<dyn BulletRewriter>,
        catalog: Box<dyn ProjectCatalog>,
        embedder: Box<dyn EmbeddingProvider>,
        session_id: &str,
    ) -> Result<Self> {
        let store = SessionStore::new(
            backend,
            config.pipeline.max_sessions,
            config.pipeline.max_session_age_hours,
        );
        if !store.can_resume(session_id)? {
            return Err(ResumeOptimizerError::Pipeline(format!(
                "session {} is older than {} hours and cannot be resumed",
                session_id, config.pipeline.max_session_age_hours
            )));
        }
        let context = store.load(session_id)?;
        info!(
            "resumed session {} at step {}",
            session_id, context.current_step
        );

        let job_profile = extract_profile(&config, &context.job_description);
        Ok(Self {
            engine: ScoringEngine::new(config.scoring.clone()),
            config,
            store,
            parser,
            rewriter,
            catalog,
            embedder,
            context,
            job_profile,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn context(&self) -> &PipelineExecutionContext {
        &self.context
    }

    pub fn progress(&self) -> ProgressIndicator {
        self.context.progress()
    }

    /// Execute the current step, retrying per its error kind's recovery
    /// strategy. The context is persisted whatever the outcome.
    pub async fn execute_step(&mut self, input: StepInput) -> Result<StepResult> {
        let step = self.context.current_step;
        if self.context.is_step_completed(step) {
            return Ok(self.result_for(step, true, None, None, false));
        }

        let started_at = chrono::Utc::now();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.run_step(step, &input).await {
                Ok(StepOutcome::Done(data)) => {
                    self.context.user_input_required = false;
                    self.context
                        .record_step_execution(step, started_at, true, attempt);
                    self.context.mark_step_completed(step);
                    self.store.save(&self.context)?;
                    return Ok(self.result_for(step, true, Some(data), None, false));
                }
                Ok(StepOutcome::NeedsInput(data)) => {
                    // Not a failure: the step is waiting on the user
                    self.context.user_input_required = true;
                    self.store.save(&self.context)?;
                    return Ok(self.result_for(step, true, Some(data), None, true));
                }
                Err(error) => {
                    let kind = ErrorKind::classify(&error);
                    let strategy = strategy_for(kind);
                    self.context.record_error(step, &error, attempt);
                    warn!(
                        "step {} attempt {} failed ({}): {}",
                        step, attempt, kind, error
                    );

                    if attempt <= strategy.max_retries {
                        continue;
                    }

                    return self.handle_step_failure(step, error, started_at, attempt);
                }
            }
        }
    }

    /// Mark a step permanently failed after its retry budget is spent.
    /// The recovery strategy's user message and fallback options travel
    /// in the result so the caller can present them.
    fn handle_step_failure(
        &mut self,
        step: PipelineStep,
        error: ResumeOptimizerError,
        started_at: chrono::DateTime<chrono::Utc>,
        attempts: u32,
    ) -> Result<StepResult> {
        let kind = ErrorKind::classify(&error);
        let strategy = strategy_for(kind);
        self.context
            .record_step_execution(step, started_at, false, attempts);
        self.context.mark_step_failed(step);
        self.context.user_input_required = true;
        self.store.save(&self.context)?;
        let detail = json!({
            "error_kind": kind.to_string(),
            "user_message": strategy.user_message,
            "fallbacks": strategy.fallbacks,
        });
        Ok(self.result_for(step, false, Some(detail), Some(error.to_string()), true))
    }

    /// Advance to the next step. A no-op while the current step has not
    /// completed: the controller never transitions past incomplete work.
    pub fn proceed_to_next_step(&mut self) -> Result<Option<PipelineStep>> {
        let step = self.context.current_step;
        if !self.context.is_step_completed(step) {
            warn!("not advancing: step {} has not completed", step);
            return Ok(None);
        }
        let next = step.next();
        if let Some(next_step) = next {
            self.context.current_step = next_step;
            self.context.user_input_required = false;
            self.store.save(&self.context)?;
        }
        Ok(next)
    }

    /// Step back one step, un-completing it so it can re-run. Resume
    /// versions already produced are kept in the history.
    pub fn rollback_to_previous_step(&mut self) -> Result<PipelineStep> {
        let Some(previous) = self.context.current_step.previous() else {
            return Err(ResumeOptimizerError::Pipeline(
                "already at the first step".to_string(),
            ));
        };
        self.context.completed_steps.retain(|s| *s != previous);
        self.context.current_step = previous;
        self.context.user_input_required = false;
        self.store.save(&self.context)?;
        Ok(previous)
    }

    async fn run_step(&mut self, step: PipelineStep, input: &StepInput) -> Result<StepOutcome> {
        match step {
            PipelineStep::ParseResume => self.step_parse(input).await,
            PipelineStep::AnalyzeAgainstJd => self.step_analyze(),
            PipelineStep::MissingSectionsModal => self.step_missing_sections(input),
            PipelineStep::ProjectAnalysis => self.step_projects(input).await,
            PipelineStep::ReAnalysis => self.step_reanalyze(),
            PipelineStep::BulletRewriting => self.step_rewrite_bullets().await,
            PipelineStep::FinalOptimization => self.step_final_optimization(),
            PipelineStep::OutputResume => self.step_output(),
        }
    }

    async fn step_parse(&mut self, input: &StepInput) -> Result<StepOutcome> {
        let Some(text) = input.resume_text.as_deref() else {
            return Err(ResumeOptimizerError::InvalidInput(
                "resume text is required for parsing".to_string(),
            ));
        };
        let parsed = self.parser.parse(text).await?;
        self.context
            .push_resume_version(PipelineStep::ParseResume, parsed.snapshot.clone(), None);

        Ok(StepOutcome::Done(json!({
            "missing_sections": parsed.missing_sections.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            "confidence": parsed.confidence,
        })))
    }

    fn step_analyze(&mut self) -> Result<StepOutcome> {
        let snapshot = self.current_snapshot()?;
        let text = snapshot.to_text();
        let analysis =
            analyze_gaps_with_profile(&self.engine, Some(&snapshot), &text, self.job_profile.as_ref());

        let coverage = self.match_coverage(&text);
        let score = analysis.score.overall_score;
        self.context
            .push_resume_version(PipelineStep::AnalyzeAgainstJd, snapshot, Some(score));

        Ok(StepOutcome::Done(json!({
            "overall_score": score,
            "ats_score": analysis.score.ats_score,
            "match_quality": analysis.score.match_quality.label(),
            "interview_chance": analysis.score.interview_chance,
            "requirement_coverage": coverage,
            "top_improvements": analysis.top_improvements(5),
            "missing_keywords": analysis.missing_keywords,
        })))
    }

    fn step_missing_sections(&mut self, input: &StepInput) -> Result<StepOutcome> {
        let mut snapshot = self.current_snapshot()?;
        let missing = snapshot.missing_sections();
        if missing.is_empty() {
            return Ok(StepOutcome::Done(json!({ "added_sections": [] })));
        }

        let Some(provided) = &input.provided_sections else {
            return Ok(StepOutcome::NeedsInput(json!({
                "missing_sections": missing.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                "issues": crate::scoring::tiers::missing_section_issues(&missing),
            })));
        };

        let mut added = Vec::new();
        for (section, content) in provided {
            if content.trim().is_empty() {
                continue;
            }
            apply_section_content(&mut snapshot, *section, content);
            added.push(section.to_string());
            self.context.record_user_input(
                PipelineStep::MissingSectionsModal,
                &format!("provide {} section", section),
                content,
            );
        }

        if !added.is_empty() {
            self.context.push_resume_version(
                PipelineStep::MissingSectionsModal,
                snapshot,
                None,
            );
        }
        Ok(StepOutcome::Done(json!({ "added_sections": added })))
    }

    async fn step_projects(&mut self, input: &StepInput) -> Result<StepOutcome> {
        let mut snapshot = self.current_snapshot()?;
        let role = RoleClass::classify(&self.context.job_description);

        let Some(approved) = &input.approved_projects else {
            // External catalogs may fail; the built-in set always answers
            let suggestions = match self.catalog.suggest(role, 3).await {
                Ok(list) => list,
                Err(e) => {
                    warn!("project catalog failed, using built-in set: {}", e);
                    crate::pipeline::collaborators::builtin_suggestions(role)
                        .into_iter()
                        .take(3)
                        .collect()
                }
            };
            return Ok(StepOutcome::NeedsInput(json!({
                "role_class": role,
                "suggestions": suggestions,
            })));
        };

        let mut added = Vec::new();
        for suggestion in approved {
            snapshot.projects.push(Project {
                title: suggestion.title.clone(),
                bullets: vec![suggestion.description.clone()],
                link: suggestion.url.clone(),
            });
            added.push(suggestion.title.clone());
            self.context.record_user_input(
                PipelineStep::ProjectAnalysis,
                "approve suggested project",
                &suggestion.title,
            );
        }

        if !added.is_empty() {
            self.context
                .push_resume_version(PipelineStep::ProjectAnalysis, snapshot, None);
        }
        Ok(StepOutcome::Done(json!({ "added_projects": added })))
    }

    fn step_reanalyze(&mut self) -> Result<StepOutcome> {
        let snapshot = self.current_snapshot()?;
        let text = snapshot.to_text();
        let score =
            self.engine
                .calculate_with_profile(&text, Some(&snapshot), self.job_profile.as_ref());
        let overall = score.overall_score;
        self.context
            .push_resume_version(PipelineStep::ReAnalysis, snapshot, Some(overall));

        Ok(StepOutcome::Done(json!({
            "overall_score": overall,
            "ats_score": score.ats_score,
            "target_score": self.config.pipeline.target_score,
            "target_reached": overall >= self.config.pipeline.target_score,
        })))
    }

    async fn step_rewrite_bullets(&mut self) -> Result<StepOutcome> {
        let mut snapshot = self.current_snapshot()?;
        let bullets: Vec<String> = snapshot
            .tagged_bullets()
            .into_iter()
            .map(|(_, b)| b)
            .collect();
        if bullets.is_empty() {
            return Ok(StepOutcome::Done(json!({ "rewritten": 0 })));
        }

        let raw = self
            .rewriter
            .rewrite(&bullets, &self.context.job_description)
            .await?;
        let rewritten = validate_rewrite(&raw, bullets.len())?;
        apply_rewritten_bullets(&mut snapshot, &rewritten);

        let count = rewritten.len();
        self.context
            .push_resume_version(PipelineStep::BulletRewriting, snapshot, None);
        Ok(StepOutcome::Done(json!({ "rewritten": count })))
    }

    fn step_final_optimization(&mut self) -> Result<StepOutcome> {
        let mut snapshot = self.current_snapshot()?;
        let text = snapshot.to_text();
        let analysis =
            analyze_gaps_with_profile(&self.engine, Some(&snapshot), &text, self.job_profile.as_ref());

        // Fold still-missing critical keywords into a dedicated skills line
        let injected = analysis.missing_keywords.critical.clone();
        if !injected.is_empty() {
            add_skills(&mut snapshot, "Additional", &injected);
        }

        // Lead the summary with the target title when it is absent
        if let Some(title) = self
            .context
            .target_role
            .clone()
            .or_else(|| self.job_profile.as_ref().and_then(|p| p.titles.first().cloned()))
        {
            let mentions_title = snapshot
                .summary
                .as_deref()
                .map(|s| s.to_lowercase().contains(&title.to_lowercase()))
                .unwrap_or(false);
            if !mentions_title {
                let rest = snapshot.summary.take().unwrap_or_default();
                snapshot.summary = Some(if rest.is_empty() {
                    title.clone()
                } else {
                    format!("{}. {}", title, rest)
                });
            }
        }

        let final_text = snapshot.to_text();
        let score = self.engine.calculate_with_profile(
            &final_text,
            Some(&snapshot),
            self.job_profile.as_ref(),
        );
        let overall = score.overall_score;
        self.context
            .push_resume_version(PipelineStep::FinalOptimization, snapshot, Some(overall));

        Ok(StepOutcome::Done(json!({
            "overall_score": overall,
            "injected_keywords": injected,
        })))
    }

    fn step_output(&mut self) -> Result<StepOutcome> {
        let snapshot = self.current_snapshot()?;
        let text = snapshot.to_text();
        let analysis =
            analyze_gaps_with_profile(&self.engine, Some(&snapshot), &text, self.job_profile.as_ref());
        let report = crate::output::report::markdown_report(&analysis);

        let first_score = self
            .context
            .resume_versions
            .iter()
            .find_map(|v| v.score)
            .unwrap_or(0);

        Ok(StepOutcome::Done(json!({
            "resume_text": text,
            "report": report,
            "initial_score": first_score,
            "final_score": analysis.score.overall_score,
            "versions": self.context.resume_versions.len(),
        })))
    }

    fn current_snapshot(&self) -> Result<ResumeSnapshot> {
        self.context
            .latest_resume()
            .map(|v| v.snapshot.clone())
            .ok_or_else(|| {
                ResumeOptimizerError::Pipeline(
                    "no resume version available; run parsing first".to_string(),
                )
            })
    }

    fn match_coverage(&self, resume_text: &str) -> f32 {
        let Some(profile) = &self.job_profile else {
            return 0.0;
        };
        let bullets: Vec<ResumeBullet> =
            crate::matching::bullets::extract_bullets(resume_text, self.config.matching.min_bullet_chars);
        let mut matcher = HybridMatcher::new(self.config.matching.clone(), &*self.embedder);
        matcher
            .match_requirements(&profile.requirements, &bullets)
            .coverage
    }

    fn result_for(
        &self,
        step: PipelineStep,
        success: bool,
        data: Option<serde_json::Value>,
        error: Option<String>,
        user_input_required: bool,
    ) -> StepResult {
        StepResult {
            success,
            step,
            data,
            error,
            next_step: if success && self.context.is_step_completed(step) {
                step.next()
            } else {
                None
            },
            user_input_required,
            progress: self.context.progress(),
        }
    }
}

fn extract_profile(config: &Config, job_description: &str) -> Option<JobProfile> {
    if job_description.chars().count() >= config.scoring.jd_min_chars {
        Some(JobProfile::extract(job_description, &config.scoring))
    } else {
        None
    }
}

/// Validate the rewriter's raw JSON against the `{"bullets": [...]}`
/// contract. Count must match so bullets map back positionally.
fn validate_rewrite(raw: &str, expected: usize) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ResumeOptimizerError::MalformedRewrite(format!("not valid JSON: {}", e)))?;
    let Some(array) = value.get("bullets").and_then(|b| b.as_array()) else {
        return Err(ResumeOptimizerError::MalformedRewrite(
            "missing \"bullets\" array".to_string(),
        ));
    };
    let bullets: Option<Vec<String>> = array
        .iter()
        .map(|v| v.as_str().map(|s| s.to_string()))
        .collect();
    let Some(bullets) = bullets else {
        return Err(ResumeOptimizerError::MalformedRewrite(
            "bullets must all be strings".to_string(),
        ));
    };
    if bullets.len() != expected {
        return Err(ResumeOptimizerError::MalformedRewrite(format!(
            "expected {} bullets, got {}",
            expected,
            bullets.len()
        )));
    }
    if bullets.iter().any(|b| b.trim().is_empty()) {
        return Err(ResumeOptimizerError::MalformedRewrite(
            "bullets must be non-empty".to_string(),
        ));
    }
    Ok(bullets)
}

/// Write rewritten bullets back in the same order `tagged_bullets`
/// produced them: experience first, then projects.
fn apply_rewritten_bullets(snapshot: &mut ResumeSnapshot, rewritten: &[String]) {
    let mut iter = rewritten.iter();
    for exp in &mut snapshot.experience {
        for bullet in &mut exp.bullets {
            if let Some(new) = iter.next() {
                *bullet = new.clone();
            }
        }
    }
    for project in &mut snapshot.projects {
        for bullet in &mut project.bullets {
            if let Some(new) = iter.next() {
                *bullet = new.clone();
            }
        }
    }
}

fn apply_section_content(snapshot: &mut ResumeSnapshot, section: SectionId, content: &str) {
    let lines: Vec<String> = content
        .lines()
        .map(|l| l.trim().trim_start_matches(['-', '*']).trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    match section {
        SectionId::Summary => snapshot.summary = Some(lines.join(" ")),
        SectionId::Skills => add_skills(
            snapshot,
            "General",
            &content
                .split([',', '\n', ';'])
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>(),
        ),
        SectionId::Certifications => snapshot.certifications.extend(lines),
        SectionId::Projects => {
            for line in lines {
                snapshot.projects.push(Project {
                    title: line,
                    bullets: Vec::new(),
                    link: None,
                });
            }
        }
        SectionId::Experience => {
            if !lines.is_empty() {
                snapshot.experience.push(WorkExperience {
                    role: lines[0].clone(),
                    company: String::new(),
                    date_range: None,
                    bullets: lines[1..].to_vec(),
                });
            }
        }
        SectionId::Education => {
            for line in lines {
                let (degree, institution) = match line.split_once(',') {
                    Some((d, i)) => (d.trim().to_string(), i.trim().to_string()),
                    None => (line, String::new()),
                };
                snapshot.education.push(crate::model::resume::Education {
                    degree,
                    institution,
                    year: None,
                });
            }
        }
        SectionId::Contact => {
            for line in &lines {
                if snapshot.contact.name.is_none() {
                    snapshot.contact.name = Some(line.clone());
                } else if snapshot.contact.email.is_none() && line.contains('@') {
                    snapshot.contact.email = Some(line.clone());
                }
            }
        }
    }
}

fn add_skills(snapshot: &mut ResumeSnapshot, category: &str, items: &[String]) {
    let new_items: Vec<String> = items
        .iter()
        .filter(|item| {
            !snapshot
                .all_skills()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(item))
        })
        .cloned()
        .collect();
    if new_items.is_empty() {
        return;
    }
    if let Some(group) = snapshot.skills.iter_mut().find(|g| g.category == category) {
        group.items.extend(new_items);
    } else {
        snapshot.skills.push(SkillGroup {
            category: category.to_string(),
            items: new_items,
        });
    }
}
