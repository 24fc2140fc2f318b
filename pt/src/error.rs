//! Error types

use std::fmt;
use thiserror::Error;

/// One problem found while reading a serialized report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Slash-separated path to the offending field, e.g. `steps/0/completion`
    pub path: String,
    /// What is wrong with it
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A serialized report failed validation
///
/// Lists every offending field found in a single pass, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid progress data: {}", join_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Paths of all offending fields, in the order they were found
    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.path.as_str()).collect()
    }

    /// Check whether a given path was reported
    pub fn has_path(&self, path: &str) -> bool {
        self.errors.iter().any(|e| e.path == path)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Errors from reading or writing progress reports
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProgressError {
    /// The validation details, if this is a validation failure
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ProgressError::Validation(e) => Some(e),
            ProgressError::Json(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProgressError>;
