//! Typed error kinds for one analysis run.
//!
//! Validation errors are fail-fast and reach the caller untouched. Retrieval
//! errors are converted into `RunStatus::RetrievalFailed` by the analyzer and
//! never escape `Analyzer::run`. Classification errors abort the run without
//! exposing partial results.

use serde::Serialize;

use crate::query::CriteriaError;
use crate::retrieval::RetrievalError;
use crate::sentiment::ClassifierError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),
    #[error("retrieval failed: {0}")]
    RetrievalFailure(#[from] RetrievalError),
    #[error("classification failed: {0}")]
    ClassificationFailure(#[from] ClassifierError),
}

/// Coarse error category used by the HTTP layer and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCriteria,
    RetrievalFailure,
    ClassificationFailure,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidCriteria(_) => ErrorKind::InvalidCriteria,
            AnalysisError::RetrievalFailure(_) => ErrorKind::RetrievalFailure,
            AnalysisError::ClassificationFailure(_) => ErrorKind::ClassificationFailure,
        }
    }
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidCriteria => "invalid_criteria",
            ErrorKind::RetrievalFailure => "retrieval_failure",
            ErrorKind::ClassificationFailure => "classification_failure",
        }
    }
}
