//! Pipeline execution context and its persisted projections
//!
//! The execution context is the audit trail of a session: every resume
//! version, step execution, user input, and error is appended and survives
//! persistence. `PipelineState` is the lightweight projection the store
//! keeps alongside the full context for listing and resumability checks.

use crate::model::resume::ResumeSnapshot;
use crate::pipeline::step::PipelineStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resume version produced by a step. Versions are never mutated in
/// place; each transforming step appends a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeVersion {
    pub version: u32,
    pub step: PipelineStep,
    pub snapshot: ResumeSnapshot,
    /// Overall score at this version, when an analysis step produced one.
    pub score: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecution {
    pub step: PipelineStep,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub success: bool,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInputRecord {
    pub step: PipelineStep,
    pub prompt: String,
    pub response: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub step: PipelineStep,
    pub kind: crate::error::ErrorKind,
    pub message: String,
    pub attempt: u32,
    pub at: DateTime<Utc>,
}

/// Full per-session state. Everything needed to resume a session after a
/// process restart lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineExecutionContext {
    pub session_id: String,
    pub user_id: String,
    pub job_description: String,
    pub target_role: Option<String>,
    pub current_step: PipelineStep,
    pub completed_steps: Vec<PipelineStep>,
    pub failed_steps: Vec<PipelineStep>,
    pub user_input_required: bool,
    pub resume_versions: Vec<ResumeVersion>,
    pub step_history: Vec<StepExecution>,
    pub user_inputs: Vec<UserInputRecord>,
    pub error_log: Vec<ErrorRecord>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `sess_<unix-millis>_<first 8 hex chars of a v4 uuid>`. Millisecond
/// timestamps keep session ids sortable by creation time.
pub fn new_session_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let uuid = Uuid::new_v4().simple().to_string();
    format!("sess_{}_{}", millis, &uuid[..8])
}

impl PipelineExecutionContext {
    pub fn new(user_id: &str, job_description: &str, target_role: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: new_session_id(),
            user_id: user_id.to_string(),
            job_description: job_description.to_string(),
            target_role,
            current_step: PipelineStep::ParseResume,
            completed_steps: Vec::new(),
            failed_steps: Vec::new(),
            user_input_required: false,
            resume_versions: Vec::new(),
            step_history: Vec::new(),
            user_inputs: Vec::new(),
            error_log: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    pub fn is_step_completed(&self, step: PipelineStep) -> bool {
        self.completed_steps.contains(&step)
    }

    pub fn mark_step_completed(&mut self, step: PipelineStep) {
        if !self.is_step_completed(step) {
            self.completed_steps.push(step);
        }
        self.failed_steps.retain(|s| *s != step);
        self.updated_at = Utc::now();
    }

    pub fn mark_step_failed(&mut self, step: PipelineStep) {
        if !self.failed_steps.contains(&step) {
            self.failed_steps.push(step);
        }
        self.updated_at = Utc::now();
    }

    /// Latest resume version, if any step has produced one yet.
    pub fn latest_resume(&self) -> Option<&ResumeVersion> {
        self.resume_versions.last()
    }

    pub fn latest_score(&self) -> Option<u32> {
        self.resume_versions.iter().rev().find_map(|v| v.score)
    }

    /// Append a new resume version and return its number.
    pub fn push_resume_version(
        &mut self,
        step: PipelineStep,
        snapshot: ResumeSnapshot,
        score: Option<u32>,
    ) -> u32 {
        let version = self.resume_versions.len() as u32 + 1;
        self.resume_versions.push(ResumeVersion {
            version,
            step,
            snapshot,
            score,
            created_at: Utc::now(),
        });
        self.updated_at = Utc::now();
        version
    }

    pub fn record_step_execution(
        &mut self,
        step: PipelineStep,
        started_at: DateTime<Utc>,
        success: bool,
        attempts: u32,
    ) {
        self.step_history.push(StepExecution {
            step,
            started_at,
            finished_at: Some(Utc::now()),
            success,
            attempts,
        });
        self.updated_at = Utc::now();
    }

    pub fn record_user_input(&mut self, step: PipelineStep, prompt: &str, response: &str) {
        self.user_inputs.push(UserInputRecord {
            step,
            prompt: prompt.to_string(),
            response: response.to_string(),
            at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    pub fn record_error(&mut self, step: PipelineStep, error: &crate::error::ResumeOptimizerError, attempt: u32) {
        self.error_log.push(ErrorRecord {
            step,
            kind: crate::error::ErrorKind::classify(error),
            message: error.to_string(),
            attempt,
            at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    /// Progress is the sum of the completed steps' fixed weights. It only
    /// reaches 100 once every step, including output, has completed.
    pub fn progress_percentage(&self) -> u32 {
        self.completed_steps
            .iter()
            .map(|s| s.progress_weight())
            .sum()
    }

    pub fn progress(&self) -> ProgressIndicator {
        ProgressIndicator {
            current_step: self.current_step.ordinal(),
            total_steps: PipelineStep::TOTAL,
            step_name: self.current_step.name().to_string(),
            step_description: self.current_step.description().to_string(),
            percentage_complete: self.progress_percentage(),
            user_action_required: self.user_input_required,
            action_description: if self.user_input_required {
                Some(self.current_step.description().to_string())
            } else {
                None
            },
        }
    }

    /// Lightweight projection persisted next to the full context for
    /// session listings.
    pub fn state(&self) -> PipelineState {
        PipelineState {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            current_step: self.current_step,
            completed_steps: self.completed_steps.clone(),
            user_input_required: self.user_input_required,
            latest_score: self.latest_score(),
            progress_percentage: self.progress_percentage(),
            started_at: self.started_at,
            updated_at: self.updated_at,
        }
    }
}

/// Summary row for session listings and resumability checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub session_id: String,
    pub user_id: String,
    pub current_step: PipelineStep,
    pub completed_steps: Vec<PipelineStep>,
    pub user_input_required: bool,
    pub latest_score: Option<u32>,
    pub progress_percentage: u32,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// UI-facing progress report for the current session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressIndicator {
    pub current_step: u32,
    pub total_steps: u32,
    pub step_name: String,
    pub step_description: String,
    pub percentage_complete: u32,
    pub user_action_required: bool,
    pub action_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let id = new_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "sess");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_progress_reaches_100_only_when_all_steps_complete() {
        let mut ctx = PipelineExecutionContext::new("user-1", "some jd", None);
        assert_eq!(ctx.progress_percentage(), 0);

        for step in PipelineStep::ALL.iter().take(7) {
            ctx.mark_step_completed(*step);
            assert!(ctx.progress_percentage() < 100);
        }
        ctx.mark_step_completed(PipelineStep::OutputResume);
        assert_eq!(ctx.progress_percentage(), 100);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut ctx = PipelineExecutionContext::new("user-1", "some jd", None);
        let mut last = 0;
        for step in PipelineStep::ALL {
            ctx.mark_step_completed(step);
            let current = ctx.progress_percentage();
            assert!(current > last);
            last = current;
        }
    }

    #[test]
    fn test_completing_a_step_twice_does_not_double_count() {
        let mut ctx = PipelineExecutionContext::new("user-1", "some jd", None);
        ctx.mark_step_completed(PipelineStep::ParseResume);
        ctx.mark_step_completed(PipelineStep::ParseResume);
        assert_eq!(ctx.progress_percentage(), 10);
        assert_eq!(ctx.completed_steps.len(), 1);
    }

    #[test]
    fn test_completion_clears_failure() {
        let mut ctx = PipelineExecutionContext::new("user-1", "some jd", None);
        ctx.mark_step_failed(PipelineStep::ParseResume);
        assert!(ctx.failed_steps.contains(&PipelineStep::ParseResume));
        ctx.mark_step_completed(PipelineStep::ParseResume);
        assert!(ctx.failed_steps.is_empty());
    }

    #[test]
    fn test_resume_versions_are_numbered_from_one() {
        let mut ctx = PipelineExecutionContext::new("user-1", "some jd", None);
        let snapshot = ResumeSnapshot::empty();
        let v1 = ctx.push_resume_version(PipelineStep::ParseResume, snapshot.clone(), None);
        let v2 = ctx.push_resume_version(PipelineStep::ReAnalysis, snapshot, Some(70));
        assert_eq!(v1, 1);
        assert_eq!(v2, 2);
        assert_eq!(ctx.latest_score(), Some(70));
    }

    #[test]
    fn test_state_projection_round_trips_as_json() {
        let ctx = PipelineExecutionContext::new("user-1", "some jd", Some("Backend".to_string()));
        let state = ctx.state();
        let json = serde_json::to_string(&state).unwrap();
        let restored: PipelineState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.session_id, ctx.session_id);
        assert_eq!(restored.current_step, PipelineStep::ParseResume);
    }
}
