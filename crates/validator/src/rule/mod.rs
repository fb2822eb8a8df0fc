//! Rule declarations
//!
//! A [`Rule`] describes one check for a field. Rules are declared per path
//! in a [`RuleSource`], either in code through the `with_*` builders or as
//! JSON:
//!
//! ```rust,ignore
//! let source: RuleSource = serde_json::from_value(json!({
//!     "name": { "required": true, "message": "name is required" },
//!     "items": {
//!         "type": "array",
//!         "defaultField": {
//!             "type": "object",
//!             "fields": { "title": { "required": true } }
//!         }
//!     }
//! }))?;
//! ```
//!
//! Container rules (`object` / `array` with `fields` or `defaultField`) are
//! *deep rules*: they imply rules for nested paths, which are derived on
//! demand by [`resolve_deep`].

mod deep;
mod index;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use deep::{DeepRegistry, resolve_deep};
pub use index::{RuleIndex, filter_by_trigger, is_deep_rule, is_required};

/// Value type a rule expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// JSON string
    String,
    /// Any JSON number
    Number,
    /// Whole number
    Integer,
    /// Number with a fractional part
    Float,
    /// JSON boolean
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// String shaped like an email address
    Email,
    /// http(s) URL string
    Url,
    /// Value listed in the rule's `enum`
    Enum,
    /// Anything
    Any,
}

impl RuleType {
    /// Lowercase type name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Email => "email",
            Self::Url => "url",
            Self::Enum => "enum",
            Self::Any => "any",
        }
    }

    /// True for the container types that can carry nested rules.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event that may trigger a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Field lost focus
    #[serde(alias = "on-blur")]
    Blur,
    /// Field value changed
    #[serde(alias = "on-change")]
    Change,
}

/// Outcome of a custom validator that did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// The value is invalid; the message is shown for the field
    #[error("{0}")]
    Invalid(String),
    /// The check itself broke; reported as an engine fault
    #[error("{0}")]
    Failed(String),
}

impl RuleViolation {
    /// Invalid value with a message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Check failure unrelated to the value.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Future returned by a custom validator.
pub type ValidatorFuture = BoxFuture<'static, Result<(), RuleViolation>>;

/// Programmatic async check attached to a rule.
#[derive(Clone)]
pub struct CustomValidator(Arc<dyn Fn(Value) -> ValidatorFuture + Send + Sync>);

impl CustomValidator {
    /// Wraps an async closure.
    pub fn new<F, Fut>(check: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RuleViolation>> + Send + 'static,
    {
        Self(Arc::new(move |value| Box::pin(check(value))))
    }

    /// Wraps a synchronous closure.
    pub fn from_fn<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), RuleViolation> + Send + Sync + 'static,
    {
        Self(Arc::new(move |value| {
            let outcome = check(&value);
            Box::pin(async move { outcome })
        }))
    }

    /// Runs the check.
    pub fn call(&self, value: Value) -> ValidatorFuture {
        (self.0)(value)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator(..)")
    }
}

/// A single declarative check for a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rule {
    /// Expected value type
    #[serde(rename = "type")]
    pub kind: Option<RuleType>,
    /// Value must be present and non-empty
    pub required: bool,
    /// Lower bound: string chars, array length or numeric value
    pub min: Option<f64>,
    /// Upper bound: string chars, array length or numeric value
    pub max: Option<f64>,
    /// Exact string chars, array length or numeric value
    pub len: Option<f64>,
    /// Regular expression a string must match
    pub pattern: Option<String>,
    /// Allowed values
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    /// Reject strings made only of whitespace
    pub whitespace: bool,
    /// Message replacing the default one
    pub message: Option<String>,
    /// Events this rule runs on; empty means every event
    #[serde(deserialize_with = "one_or_many")]
    pub trigger: Vec<Trigger>,
    /// Rules for named nested fields
    pub fields: Option<IndexMap<String, RuleSet>>,
    /// Rules for every element / member
    pub default_field: Option<Box<RuleSet>>,
    /// Custom async check
    #[serde(skip)]
    pub validator: Option<CustomValidator>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Trigger>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Trigger),
        Many(Vec<Trigger>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(trigger)) => vec![trigger],
        Some(OneOrMany::Many(triggers)) => triggers,
    })
}

impl Rule {
    /// Empty rule; passes everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule requiring a non-empty value.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// Rule requiring a value type.
    pub fn of_type(kind: RuleType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Sets the required flag.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the expected type.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_type(mut self, kind: RuleType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the message reported on failure.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the lower bound.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets the upper bound.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets the exact length / value.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_len(mut self, len: f64) -> Self {
        self.len = Some(len);
        self
    }

    /// Sets the regular expression.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Sets the allowed values.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    /// Rejects whitespace-only strings.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_whitespace(mut self) -> Self {
        self.whitespace = true;
        self
    }

    /// Adds a trigger event.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        if !self.trigger.contains(&trigger) {
            self.trigger.push(trigger);
        }
        self
    }

    /// Declares rules for a named nested field.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_field(mut self, name: impl Into<String>, rules: impl Into<RuleSet>) -> Self {
        self.fields
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), rules.into());
        self
    }

    /// Declares rules applied to every element or member.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_default_field(mut self, rules: impl Into<RuleSet>) -> Self {
        self.default_field = Some(Box::new(rules.into()));
        self
    }

    /// Attaches a custom check.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_validator(mut self, validator: CustomValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// True when the rule runs for `trigger`.
    pub fn admits(&self, trigger: Trigger) -> bool {
        self.trigger.is_empty() || self.trigger.contains(&trigger)
    }
}

/// One rule or an ordered list of rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleSet {
    /// Ordered rules
    Many(Vec<Rule>),
    /// Single rule
    One(Box<Rule>),
}

impl RuleSet {
    /// The rules as an ordered list.
    pub fn to_vec(&self) -> Vec<Rule> {
        match self {
            Self::One(rule) => vec![rule.as_ref().clone()],
            Self::Many(rules) => rules.clone(),
        }
    }

    /// Borrows the rules as a slice.
    pub fn as_slice(&self) -> &[Rule] {
        match self {
            Self::One(rule) => std::slice::from_ref(rule.as_ref()),
            Self::Many(rules) => rules,
        }
    }
}

impl From<Rule> for RuleSet {
    fn from(rule: Rule) -> Self {
        Self::One(Box::new(rule))
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::Many(rules)
    }
}

/// Declared rules keyed by raw field key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RuleSource(IndexMap<String, RuleSet>);

impl RuleSource {
    /// Empty rule table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a rule table from JSON.
    pub fn from_json(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Adds rules for a key, builder style.
    #[must_use = "builder methods must be chained or built"]
    pub fn with(mut self, key: impl Into<String>, rules: impl Into<RuleSet>) -> Self {
        self.insert(key, rules);
        self
    }

    /// Adds or replaces rules for a key.
    pub fn insert(&mut self, key: impl Into<String>, rules: impl Into<RuleSet>) {
        self.0.insert(key.into(), rules.into());
    }

    /// Removes the rules for a key.
    pub fn remove(&mut self, key: &str) -> Option<RuleSet> {
        self.0.shift_remove(key)
    }

    /// Iterates declared keys and rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleSet)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
