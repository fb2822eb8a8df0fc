//! Per-field validation status

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::path::FieldPath;

/// Where a field is in its validation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidateStatus {
    /// Not validated, or cleared
    #[default]
    None,
    /// A rule engine call is in flight
    Validating,
    /// Last validation passed
    Success,
    /// Last validation failed
    Error,
}

impl fmt::Display for ValidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Validating => write!(f, "validating"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Status projection for one field, as consumed by UI bindings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationInfo {
    /// Any rule for the field is `required`
    pub required: bool,
    /// Current status
    pub validate_status: ValidateStatus,
    /// First message of the last failure
    pub error: Option<String>,
}

impl ValidationInfo {
    /// Fresh entry with no status.
    pub fn new(required: bool) -> Self {
        Self {
            required,
            validate_status: ValidateStatus::None,
            error: None,
        }
    }

    /// True when the last validation failed.
    pub fn is_error(&self) -> bool {
        self.validate_status == ValidateStatus::Error
    }
}

/// Combines several infos into one, e.g. for a compound input bound to
/// multiple fields.
///
/// Status precedence is error, validating, success, none. Error messages
/// are joined with `", "`.
pub fn merge_validation_info(infos: &[ValidationInfo]) -> ValidationInfo {
    let required = infos.iter().any(|info| info.required);
    let has = |status| infos.iter().any(|info| info.validate_status == status);
    let validate_status = if has(ValidateStatus::Error) {
        ValidateStatus::Error
    } else if has(ValidateStatus::Validating) {
        ValidateStatus::Validating
    } else if has(ValidateStatus::Success) {
        ValidateStatus::Success
    } else {
        ValidateStatus::None
    };

    let messages: Vec<&str> = infos.iter().filter_map(|info| info.error.as_deref()).collect();
    ValidationInfo {
        required,
        validate_status,
        error: (!messages.is_empty()).then(|| messages.join(", ")),
    }
}

/// Map from path to its [`ValidationInfo`], in registration order.
#[derive(Debug, Clone, Default)]
pub struct ValidationState {
    infos: IndexMap<FieldPath, ValidationInfo>,
}

impl ValidationState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fresh entry, or refreshes `required` on an existing one.
    pub fn register(&mut self, path: FieldPath, required: bool) {
        self.infos
            .entry(path)
            .and_modify(|info| info.required = required)
            .or_insert_with(|| ValidationInfo::new(required));
    }

    /// Updates `required`, keeping status and error.
    pub fn refresh_required(&mut self, path: &str, required: bool) {
        if let Some(info) = self.infos.get_mut(path) {
            info.required = required;
        }
    }

    /// Writes a status; a no-op for unknown paths.
    pub fn set(&mut self, path: &str, status: ValidateStatus, error: Option<String>) {
        if let Some(info) = self.infos.get_mut(path) {
            info.validate_status = status;
            info.error = error;
        }
    }

    /// Back to `none` with no error.
    pub fn reset(&mut self, path: &str) {
        self.set(path, ValidateStatus::None, None);
    }

    /// Drops an entry.
    pub fn remove(&mut self, path: &str) -> Option<ValidationInfo> {
        self.infos.shift_remove(path)
    }

    /// Entry for a path.
    pub fn get(&self, path: &str) -> Option<&ValidationInfo> {
        self.infos.get(path)
    }

    /// True when the path has an entry.
    pub fn contains(&self, path: &str) -> bool {
        self.infos.contains_key(path)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &ValidationInfo)> {
        self.infos.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Owned copy of every entry, keyed by plain string.
    pub fn snapshot(&self) -> IndexMap<String, ValidationInfo> {
        self.infos
            .iter()
            .map(|(path, info)| (path.to_string(), info.clone()))
            .collect()
    }
}
