//! The 8-step resumable optimization pipeline

pub mod collaborators;
pub mod context;
pub mod controller;
pub mod recovery;
pub mod step;
pub mod store;

pub use collaborators::{
    BulletRewriter, ParsedResume, ProjectCatalog, ProjectSuggestion, ResumeParser, RoleClass,
};
pub use context::{
    ErrorRecord, PipelineExecutionContext, PipelineState, ProgressIndicator, ResumeVersion,
    StepExecution, UserInputRecord,
};
pub use controller::{PipelineController, StepInput, StepResult};
pub use recovery::ErrorRecoveryStrategy;
pub use step::PipelineStep;
pub use store::{FileStore, KeyValueStore, MemoryStore, SessionStore};
