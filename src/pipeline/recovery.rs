//! Error recovery strategies
//!
//! Each error kind maps to a fixed strategy: how many retries the
//! controller gets, which fallbacks to offer once retries are exhausted,
//! and what the user should be told. Strategies never lose progress;
//! completed steps stay completed.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecoveryStrategy {
    pub kind: ErrorKind,
    pub max_retries: u32,
    /// Fallback actions to offer once retries run out, in preference order.
    pub fallbacks: Vec<String>,
    pub user_message: String,
    pub preserves_progress: bool,
}

pub fn strategy_for(kind: ErrorKind) -> ErrorRecoveryStrategy {
    match kind {
        ErrorKind::ParsingFailure => ErrorRecoveryStrategy {
            kind,
            max_retries: 2,
            fallbacks: vec![
                "paste the resume as plain text".to_string(),
                "upload the resume in a different format".to_string(),
            ],
            user_message: "We couldn't read your resume. Try pasting the text directly."
                .to_string(),
            preserves_progress: true,
        },
        ErrorKind::AuthenticationError => ErrorRecoveryStrategy {
            kind,
            max_retries: 1,
            fallbacks: vec!["sign in again and resume the session".to_string()],
            user_message: "Your session credentials expired. Sign in again to continue."
                .to_string(),
            preserves_progress: true,
        },
        ErrorKind::FileFormatError => ErrorRecoveryStrategy {
            kind,
            max_retries: 0,
            fallbacks: vec![
                "convert the file to PDF or plain text".to_string(),
                "paste the resume as plain text".to_string(),
            ],
            user_message: "That file format isn't supported. PDF, DOCX, and plain text work."
                .to_string(),
            preserves_progress: true,
        },
        ErrorKind::AnalysisTimeout => ErrorRecoveryStrategy {
            kind,
            max_retries: 3,
            fallbacks: vec!["run a simplified analysis".to_string()],
            user_message: "Analysis is taking longer than expected. We'll retry automatically."
                .to_string(),
            preserves_progress: true,
        },
        ErrorKind::NetworkError => ErrorRecoveryStrategy {
            kind,
            max_retries: 3,
            fallbacks: vec!["resume the session once you're back online".to_string()],
            user_message: "Connection problem. Your progress is saved; retry when online."
                .to_string(),
            preserves_progress: true,
        },
        ErrorKind::ValidationError => ErrorRecoveryStrategy {
            kind,
            max_retries: 1,
            fallbacks: vec!["review and correct the provided input".to_string()],
            user_message: "Some of the provided input didn't validate. Please review it."
                .to_string(),
            preserves_progress: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_preserves_progress() {
        let kinds = [
            ErrorKind::ParsingFailure,
            ErrorKind::AuthenticationError,
            ErrorKind::FileFormatError,
            ErrorKind::AnalysisTimeout,
            ErrorKind::NetworkError,
            ErrorKind::ValidationError,
        ];
        for kind in kinds {
            let strategy = strategy_for(kind);
            assert!(strategy.preserves_progress, "{:?}", kind);
            assert!(!strategy.user_message.is_empty());
            assert!(!strategy.fallbacks.is_empty());
        }
    }

    #[test]
    fn test_retry_budgets() {
        assert_eq!(strategy_for(ErrorKind::ParsingFailure).max_retries, 2);
        assert_eq!(strategy_for(ErrorKind::AnalysisTimeout).max_retries, 3);
        assert_eq!(strategy_for(ErrorKind::NetworkError).max_retries, 3);
        assert_eq!(strategy_for(ErrorKind::FileFormatError).max_retries, 0);
    }
}
