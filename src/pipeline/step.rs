//! Pipeline step definitions
//!
//! The eight steps are strictly ordered; each step's input is the previous
//! step's resume version. Progress weights are fixed at the data-model
//! level and sum to exactly 100 (asserted in tests, never recomputed at
//! runtime).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    ParseResume,
    AnalyzeAgainstJd,
    MissingSectionsModal,
    ProjectAnalysis,
    ReAnalysis,
    BulletRewriting,
    FinalOptimization,
    OutputResume,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 8] = [
        PipelineStep::ParseResume,
        PipelineStep::AnalyzeAgainstJd,
        PipelineStep::MissingSectionsModal,
        PipelineStep::ProjectAnalysis,
        PipelineStep::ReAnalysis,
        PipelineStep::BulletRewriting,
        PipelineStep::FinalOptimization,
        PipelineStep::OutputResume,
    ];

    pub const TOTAL: u32 = 8;

    /// 1-based position in the pipeline.
    pub fn ordinal(&self) -> u32 {
        match self {
            PipelineStep::ParseResume => 1,
            PipelineStep::AnalyzeAgainstJd => 2,
            PipelineStep::MissingSectionsModal => 3,
            PipelineStep::ProjectAnalysis => 4,
            PipelineStep::ReAnalysis => 5,
            PipelineStep::BulletRewriting => 6,
            PipelineStep::FinalOptimization => 7,
            PipelineStep::OutputResume => 8,
        }
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal.checked_sub(1)? as usize).copied()
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_ordinal(self.ordinal() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        Self::from_ordinal(self.ordinal().checked_sub(1)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineStep::ParseResume => "Parse Resume",
            PipelineStep::AnalyzeAgainstJd => "Analyze Against Job Description",
            PipelineStep::MissingSectionsModal => "Collect Missing Sections",
            PipelineStep::ProjectAnalysis => "Project Analysis",
            PipelineStep::ReAnalysis => "Re-Analysis",
            PipelineStep::BulletRewriting => "Bullet Rewriting",
            PipelineStep::FinalOptimization => "Final Optimization",
            PipelineStep::OutputResume => "Generate Output",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PipelineStep::ParseResume => "Extract structured data from the resume text",
            PipelineStep::AnalyzeAgainstJd => {
                "Score the resume against the job description and match requirements"
            }
            PipelineStep::MissingSectionsModal => {
                "Ask for resume sections the parser could not find"
            }
            PipelineStep::ProjectAnalysis => {
                "Check project relevance and suggest aligned projects"
            }
            PipelineStep::ReAnalysis => "Re-score after the collected additions",
            PipelineStep::BulletRewriting => "Rewrite weak bullets toward the job's language",
            PipelineStep::FinalOptimization => "Apply remaining keyword and summary fixes",
            PipelineStep::OutputResume => "Produce the final resume and report",
        }
    }

    /// Fixed share of overall progress, in percent. Sums to exactly 100
    /// across all steps.
    pub fn progress_weight(&self) -> u32 {
        match self {
            PipelineStep::ParseResume => 10,
            PipelineStep::AnalyzeAgainstJd => 15,
            PipelineStep::MissingSectionsModal => 10,
            PipelineStep::ProjectAnalysis => 15,
            PipelineStep::ReAnalysis => 10,
            PipelineStep::BulletRewriting => 20,
            PipelineStep::FinalOptimization => 15,
            PipelineStep::OutputResume => 5,
        }
    }

    /// Whether this step is permitted to block on a human. Only the
    /// missing-sections and project-analysis steps may; every other step
    /// is fully automatic.
    pub fn may_request_user_input(&self) -> bool {
        matches!(
            self,
            PipelineStep::MissingSectionsModal | PipelineStep::ProjectAnalysis
        )
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{})", self.name(), self.ordinal(), Self::TOTAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_weights_sum_to_100() {
        let sum: u32 = PipelineStep::ALL.iter().map(|s| s.progress_weight()).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_ordinals_are_dense_1_to_8() {
        for (index, step) in PipelineStep::ALL.iter().enumerate() {
            assert_eq!(step.ordinal() as usize, index + 1);
            assert_eq!(PipelineStep::from_ordinal(step.ordinal()), Some(*step));
        }
        assert_eq!(PipelineStep::from_ordinal(0), None);
        assert_eq!(PipelineStep::from_ordinal(9), None);
    }

    #[test]
    fn test_next_previous() {
        assert_eq!(
            PipelineStep::ParseResume.next(),
            Some(PipelineStep::AnalyzeAgainstJd)
        );
        assert_eq!(PipelineStep::OutputResume.next(), None);
        assert_eq!(PipelineStep::ParseResume.previous(), None);
    }

    #[test]
    fn test_only_steps_3_and_4_may_request_input() {
        for step in PipelineStep::ALL {
            let expected = step.ordinal() == 3 || step.ordinal() == 4;
            assert_eq!(step.may_request_user_input(), expected, "{:?}", step);
        }
    }
}
