//! Error types for form validation
//!
//! Field validation failures are expected outcomes and travel as a
//! structured [`ValidationFailure`] map. Everything else (engine faults,
//! model writes that cannot be applied, bad configuration) has its own
//! variant so callers never mistake infrastructure trouble for an invalid
//! field.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result type for form operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for form validation operations
#[derive(Error, Debug)]
pub enum Error {
    /// One or more fields failed their rules
    #[error("validation failed for {} field(s)", .0.fields.len())]
    Validation(ValidationFailure),

    /// The rule engine failed without attributing the failure to a field
    #[error("rule engine failed on '{path}': {message}")]
    Engine {
        /// Path that was being validated
        path: String,
        /// Value handed to the engine
        value: Value,
        /// Failure description
        message: String,
    },

    /// A model write could not be applied
    #[error("cannot write model path '{path}': {reason}")]
    Model {
        /// Target path
        path: String,
        /// Why the write was rejected
        reason: String,
    },

    /// Invalid options or rule declarations
    #[error("configuration error: {message}")]
    Config {
        /// The error message
        message: String,
        /// Underlying error, when there is one
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a configuration error without a source.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a model write error.
    pub fn model(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Model {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the failure map if this is a field validation failure.
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Validation(failure) => Some(failure),
            _ => None,
        }
    }

    /// True for field validation failures, false for every other kind.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True for rule engine faults.
    pub fn is_engine(&self) -> bool {
        matches!(self, Self::Engine { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// A single rule violation reported for a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Human-readable message
    pub message: String,
    /// The value that failed
    pub field_value: Value,
    /// Canonical path of the failing field
    pub field: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, field_value: Value, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_value,
            field: field.into(),
        }
    }
}

/// Structured failure report: every violation in order, plus the same
/// violations grouped by path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationFailure {
    /// All violations in the order they were found
    pub errors: Vec<FieldError>,
    /// Violations grouped by field path
    pub fields: IndexMap<String, Vec<FieldError>>,
}

impl ValidationFailure {
    /// Creates an empty failure report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a report from a flat list of violations.
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        let mut failure = Self::new();
        for error in errors {
            failure.push(error);
        }
        failure
    }

    /// Records one violation.
    pub fn push(&mut self, error: FieldError) {
        self.fields
            .entry(error.field.clone())
            .or_default()
            .push(error.clone());
        self.errors.push(error);
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: ValidationFailure) {
        self.errors.extend(other.errors);
        for (path, errors) in other.fields {
            self.fields.entry(path).or_default().extend(errors);
        }
    }

    /// True when no violation was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.fields.is_empty()
    }

    /// True when `path` has at least one violation.
    pub fn contains(&self, path: &str) -> bool {
        self.fields.get(path).is_some_and(|errors| !errors.is_empty())
    }

    /// Violations recorded for `path`.
    pub fn errors_for(&self, path: &str) -> &[FieldError] {
        self.fields.get(path).map_or(&[], Vec::as_slice)
    }

    /// First message recorded for `path`.
    pub fn first_message(&self, path: &str) -> Option<&str> {
        self.errors_for(path).first().map(|e| e.message.as_str())
    }
}
