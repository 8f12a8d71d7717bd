//! Error handling for the resume optimizer

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeOptimizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resume parsing error: {0}")]
    Parsing(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Analysis timed out: {0}")]
    AnalysisTimeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Rewriter returned malformed output: {0}")]
    MalformedRewrite(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

pub type Result<T> = std::result::Result<T, ResumeOptimizerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ResumeOptimizerError {
    fn from(err: anyhow::Error) -> Self {
        ResumeOptimizerError::Pipeline(err.to_string())
    }
}

/// Coarse error classification used by the pipeline recovery strategies.
///
/// Every error surfaced to the controller collapses to one of these kinds;
/// the kind decides the retry budget and fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ParsingFailure,
    AuthenticationError,
    FileFormatError,
    AnalysisTimeout,
    NetworkError,
    ValidationError,
}

impl ErrorKind {
    pub fn classify(error: &ResumeOptimizerError) -> Self {
        match error {
            ResumeOptimizerError::Parsing(_) => ErrorKind::ParsingFailure,
            ResumeOptimizerError::Authentication(_) => ErrorKind::AuthenticationError,
            ResumeOptimizerError::UnsupportedFormat(_) => ErrorKind::FileFormatError,
            ResumeOptimizerError::AnalysisTimeout(_) => ErrorKind::AnalysisTimeout,
            ResumeOptimizerError::Network(_)
            | ResumeOptimizerError::Io(_)
            | ResumeOptimizerError::Storage(_) => ErrorKind::NetworkError,
            ResumeOptimizerError::Validation(_)
            | ResumeOptimizerError::MalformedRewrite(_)
            | ResumeOptimizerError::Serialization(_)
            | ResumeOptimizerError::InvalidInput(_)
            | ResumeOptimizerError::Configuration(_)
            | ResumeOptimizerError::SessionNotFound(_) => ErrorKind::ValidationError,
            // Embedding and pipeline errors retry as transient analysis problems
            _ => ErrorKind::AnalysisTimeout,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ParsingFailure => "parsing_failure",
            ErrorKind::AuthenticationError => "authentication_error",
            ErrorKind::FileFormatError => "file_format_error",
            ErrorKind::AnalysisTimeout => "analysis_timeout",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ValidationError => "validation_error",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = ResumeOptimizerError::Parsing("bad resume".to_string());
        assert_eq!(ErrorKind::classify(&err), ErrorKind::ParsingFailure);

        let err = ResumeOptimizerError::Network("connection refused".to_string());
        assert_eq!(ErrorKind::classify(&err), ErrorKind::NetworkError);

        let err = ResumeOptimizerError::MalformedRewrite("not json".to_string());
        assert_eq!(ErrorKind::classify(&err), ErrorKind::ValidationError);
    }

    #[test]
    fn test_non_transient_errors_are_not_retried_as_timeouts() {
        let err = ResumeOptimizerError::Configuration("bad toml".to_string());
        assert_eq!(ErrorKind::classify(&err), ErrorKind::ValidationError);

        let err = ResumeOptimizerError::SessionNotFound("sess_0_0".to_string());
        assert_eq!(ErrorKind::classify(&err), ErrorKind::ValidationError);

        let err = ResumeOptimizerError::Storage("backing file unreadable".to_string());
        assert_eq!(ErrorKind::classify(&err), ErrorKind::NetworkError);

        let err = ResumeOptimizerError::Embedding("provider offline".to_string());
        assert_eq!(ErrorKind::classify(&err), ErrorKind::AnalysisTimeout);
    }

    #[test]
    fn test_kind_display_matches_taxonomy() {
        assert_eq!(ErrorKind::AnalysisTimeout.to_string(), "analysis_timeout");
        assert_eq!(ErrorKind::FileFormatError.to_string(), "file_format_error");
    }
}
