//! Default rule engine
//!
//! Implements the usual declarative checks: `required`, `type`, `enum`,
//! `min`/`max`/`len`, `pattern`, `whitespace`, custom validators, and
//! nested validation through `fields` / `defaultField`. Nested failures are
//! reported under their full dotted path (`items.0.name`).

use std::sync::LazyLock;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Value;

use super::{CheckRequest, Rejection, RuleEngine};
use crate::error::{FieldError, ValidationFailure};
use crate::path;
use crate::rule::{Rule, RuleType, RuleViolation, is_deep_rule};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex is valid")
});

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url regex is valid"));

/// Rule engine covering the declarative rule vocabulary.
///
/// Compiled `pattern` regexes are cached per engine instance.
#[derive(Debug, Default)]
pub struct BuiltinEngine {
    patterns: DashMap<String, Regex>,
}

impl BuiltinEngine {
    /// Creates an engine with an empty pattern cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn regex(&self, pattern: &str) -> Result<Regex, String> {
        if let Some(hit) = self.patterns.get(pattern) {
            return Ok(hit.value().clone());
        }
        let compiled =
            Regex::new(pattern).map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
        self.patterns
            .insert(pattern.to_owned(), compiled.clone());
        Ok(compiled)
    }

    fn check_field<'a>(
        &'a self,
        field: &'a str,
        rules: &'a [Rule],
        value: &'a Value,
        first: bool,
    ) -> BoxFuture<'a, Result<Vec<FieldError>, String>> {
        async move {
            let mut errors = Vec::new();
            for rule in rules {
                let found = self.check_rule(field, rule, value, first).await?;
                let own_failure = found.iter().any(|e| e.field == field);
                errors.extend(found);
                if first && own_failure {
                    break;
                }
            }
            Ok(errors)
        }
        .boxed()
    }

    async fn check_rule(
        &self,
        field: &str,
        rule: &Rule,
        value: &Value,
        first: bool,
    ) -> Result<Vec<FieldError>, String> {
        if let Some(message) = self.check_declared(field, rule, value)? {
            let message = rule.message.clone().unwrap_or(message);
            return Ok(vec![FieldError::new(field, value.clone(), message)]);
        }

        if let Some(validator) = &rule.validator {
            match validator.call(value.clone()).await {
                Ok(()) => {}
                Err(RuleViolation::Invalid(message)) => {
                    let message = if message.is_empty() {
                        rule.message
                            .clone()
                            .unwrap_or_else(|| format!("{field} is invalid"))
                    } else {
                        message
                    };
                    return Ok(vec![FieldError::new(field, value.clone(), message)]);
                }
                Err(RuleViolation::Failed(reason)) => return Err(reason),
            }
        }

        if is_deep_rule(rule) {
            return self.check_nested(field, rule, value, first).await;
        }
        Ok(Vec::new())
    }

    async fn check_nested(
        &self,
        field: &str,
        rule: &Rule,
        value: &Value,
        first: bool,
    ) -> Result<Vec<FieldError>, String> {
        let mut keys: Vec<String> = match value {
            Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            Value::Object(map) => map.keys().cloned().collect(),
            _ => return Ok(Vec::new()),
        };
        if let Some(fields) = &rule.fields {
            for key in fields.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }

        let mut errors = Vec::new();
        for key in keys {
            let mut rules = Vec::new();
            if let Some(default_field) = &rule.default_field {
                rules.extend(default_field.to_vec());
            }
            if let Some(named) = rule.fields.as_ref().and_then(|f| f.get(&key)) {
                rules.extend(named.to_vec());
            }
            if rules.is_empty() {
                continue;
            }

            let child = match value {
                Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                Value::Object(map) => map.get(&key),
                _ => None,
            }
            .cloned()
            .unwrap_or(Value::Null);
            let child_path = path::join(field, &key);
            errors.extend(self.check_field(&child_path, &rules, &child, first).await?);
        }
        Ok(errors)
    }

    /// Runs the declarative (non-custom) checks. Returns the default
    /// failure message, or an error string when the rule itself is broken.
    fn check_declared(
        &self,
        field: &str,
        rule: &Rule,
        value: &Value,
    ) -> Result<Option<String>, String> {
        let empty = is_empty_value(value);

        if rule.required && empty {
            return Ok(Some(format!("{field} is required")));
        }
        if rule.whitespace && value.as_str().is_some_and(|s| s.trim().is_empty()) && !empty {
            return Ok(Some(format!("{field} cannot be empty")));
        }
        if empty {
            return Ok(None);
        }

        if let Some(kind) = rule.kind {
            if !matches_type(kind, value) {
                return Ok(Some(format!("{field} is not a valid {kind}")));
            }
        }

        if let Some(allowed) = &rule.enum_values {
            if !allowed.contains(value) {
                let list = allowed
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Ok(Some(format!("{field} must be one of {list}")));
            }
        }

        if let Some(message) = check_range(field, rule, value) {
            return Ok(Some(message));
        }

        if let (Some(pattern), Some(text)) = (&rule.pattern, value.as_str()) {
            if !self.regex(pattern)?.is_match(text) {
                return Ok(Some(format!(
                    "{field} value {text} does not match pattern {pattern}"
                )));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl RuleEngine for BuiltinEngine {
    async fn check(&self, request: CheckRequest) -> Result<(), Rejection> {
        let mut failure = ValidationFailure::new();
        for (field, rules) in &request.rules {
            let value = request.values.get(field).cloned().unwrap_or(Value::Null);
            let errors = self
                .check_field(field, rules, &value, request.first)
                .await
                .map_err(Rejection::Fault)?;
            for error in errors {
                failure.push(error);
            }
        }

        if failure.is_empty() {
            Ok(())
        } else {
            Err(Rejection::Invalid(failure))
        }
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn is_integer(value: &Value) -> bool {
    value.as_number().is_some_and(|n| {
        n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
    })
}

fn matches_type(kind: RuleType, value: &Value) -> bool {
    match kind {
        RuleType::String => value.is_string(),
        RuleType::Number => value.is_number(),
        RuleType::Integer => is_integer(value),
        RuleType::Float => value.is_number() && !is_integer(value),
        RuleType::Boolean => value.is_boolean(),
        RuleType::Array => value.is_array(),
        RuleType::Object => value.is_object(),
        RuleType::Email => value.as_str().is_some_and(|s| EMAIL_REGEX.is_match(s)),
        RuleType::Url => value.as_str().is_some_and(|s| URL_REGEX.is_match(s)),
        RuleType::Enum | RuleType::Any => true,
    }
}

fn check_range(field: &str, rule: &Rule, value: &Value) -> Option<String> {
    if rule.min.is_none() && rule.max.is_none() && rule.len.is_none() {
        return None;
    }
    let (measured, unit) = match value {
        Value::String(s) => (s.chars().count() as f64, " characters"),
        Value::Array(items) => (items.len() as f64, " items"),
        Value::Number(n) => (n.as_f64()?, ""),
        _ => return None,
    };

    if let Some(len) = rule.len {
        return (measured != len).then(|| format!("{field} must be exactly {len}{unit}"));
    }
    match (rule.min, rule.max) {
        (Some(min), Some(max)) if measured < min || measured > max => {
            Some(format!("{field} must be between {min} and {max}{unit}"))
        }
        (Some(min), None) if measured < min => {
            Some(format!("{field} must be at least {min}{unit}"))
        }
        (None, Some(max)) if measured > max => {
            Some(format!("{field} must be at most {max}{unit}"))
        }
        _ => None,
    }
}
