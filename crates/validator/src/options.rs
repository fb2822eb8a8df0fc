//! Form configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound for `debounce_ms`.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Behavior switches for a [`Form`](crate::Form).
///
/// Deserializes from camelCase JSON; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormOptions {
    /// Resolve rules for undeclared nested paths through container rules
    pub deep: bool,
    /// Validate a field whose key is missing from its (present) parent
    pub strict: bool,
    /// Validate every declared field once the form is built
    pub immediate: bool,
    /// Revalidate after `set_rules`
    pub validate_on_rule_change: bool,
    /// Revalidate a field when its value changes
    pub validate_on_change: bool,
    /// Delay for change-triggered validation, per path
    pub debounce_ms: Option<u64>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            deep: false,
            strict: false,
            immediate: false,
            validate_on_rule_change: true,
            validate_on_change: true,
            debounce_ms: None,
        }
    }
}

impl FormOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables deep rule resolution.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Enables strict absence handling.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validates on construction.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Revalidates after rule changes.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_validate_on_rule_change(mut self, enabled: bool) -> Self {
        self.validate_on_rule_change = enabled;
        self
    }

    /// Revalidates on value changes.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = enabled;
        self
    }

    /// Debounces change-triggered validation.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_debounce(mut self, wait: Duration) -> Self {
        self.debounce_ms = Some(u64::try_from(wait.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Debounce delay, if any. Zero counts as none.
    pub fn debounce(&self) -> Option<Duration> {
        self.debounce_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Sanity-checks the options.
    pub fn validate(&self) -> Result<()> {
        if let Some(ms) = self.debounce_ms {
            if ms > MAX_DEBOUNCE_MS {
                return Err(Error::config(format!(
                    "debounce_ms must be at most {MAX_DEBOUNCE_MS}, got {ms}"
                )));
            }
        }
        Ok(())
    }
}
