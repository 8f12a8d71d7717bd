//! CLI interface for the resume optimizer

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-optimizer")]
#[command(about = "Resume scoring and optimization against job descriptions")]
#[command(
    long_about = "Score resumes against job descriptions with a 16-parameter ATS model, \
                  analyze gaps, and run a resumable 8-step optimization pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a resume, optionally against a job description
    Score {
        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// Output detailed gap analysis
        #[arg(short, long)]
        detailed: bool,

        /// Output format: console, json, markdown, csv
        #[arg(short, long, default_value = "console")]
        output: String,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Run the full 8-step optimization pipeline
    Optimize {
        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Target role title to align the summary with
        #[arg(long)]
        role: Option<String>,

        /// User id owning the session
        #[arg(short, long, default_value = "local")]
        user: String,

        /// Answer interactive steps with defaults instead of prompting
        #[arg(long)]
        non_interactive: bool,

        /// Save the optimized resume to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Session management commands
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// List stored sessions
    List {
        /// Only sessions for this user
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Resume a stored session
    Resume {
        /// Session id (sess_...)
        session_id: String,

        /// Answer interactive steps with defaults instead of prompting
        #[arg(long)]
        non_interactive: bool,
    },

    /// Delete a stored session
    Delete {
        /// Session id to delete
        session_id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        "csv" => Ok(crate::config::OutputFormat::Csv),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown, csv",
            format
        )),
    }
}

/// Validate that a file has one of the expected extensions
pub fn validate_file_extension(path: &PathBuf, allowed: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if allowed.contains(&ext.to_lowercase().as_str()) => Ok(()),
        Some(ext) => Err(format!(
            "unsupported extension '{}', expected one of: {}",
            ext,
            allowed.join(", ")
        )),
        None => Err(format!(
            "file has no extension, expected one of: {}",
            allowed.join(", ")
        )),
    }
}
