//! Rule engine seam
//!
//! The form decides *what* to validate and *when*; a [`RuleEngine`] decides
//! whether a value satisfies a rule list. Engines report two distinct
//! outcomes on failure: a structured [`ValidationFailure`] when values are
//! invalid, and a [`Rejection::Fault`] when the check itself could not run.

mod builtin;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ValidationFailure;
use crate::rule::Rule;

pub use builtin::BuiltinEngine;

/// One engine invocation: rules and values keyed by canonical path.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    /// Rules to apply per path
    pub rules: IndexMap<String, Vec<Rule>>,
    /// Value per path; absent values are passed as `null`
    pub values: IndexMap<String, Value>,
    /// Stop at the first failing rule of each field
    pub first: bool,
}

impl CheckRequest {
    /// Request scoped to a single field.
    pub fn single(path: impl Into<String>, rules: Vec<Rule>, value: Value) -> Self {
        let path = path.into();
        let mut request = Self {
            first: true,
            ..Self::default()
        };
        request.rules.insert(path.clone(), rules);
        request.values.insert(path, value);
        request
    }
}

/// Why an engine call did not pass.
#[derive(Debug, Clone)]
pub enum Rejection {
    /// Values broke rules; per-path messages attached
    Invalid(ValidationFailure),
    /// The engine failed without field attribution
    Fault(String),
}

/// Evaluates values against rule lists.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    /// Checks every path in the request.
    async fn check(&self, request: CheckRequest) -> Result<(), Rejection>;
}
