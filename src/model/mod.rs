//! Data model: resume snapshots and job-description extraction

pub mod job;
pub mod resume;

pub use job::{JobProfile, JobRequirement, RequirementCategory, RequirementPriority};
pub use resume::{ResumeSnapshot, SectionId};
