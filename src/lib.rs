//! Resume optimizer library

pub mod cli;
pub mod config;
pub mod error;
pub mod matching;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod scoring;

pub use config::Config;
pub use error::{Result, ResumeOptimizerError};
