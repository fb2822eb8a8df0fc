//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use formwork_validator::prelude::*;
//! ```

pub use crate::engine::{BuiltinEngine, CheckRequest, Rejection, RuleEngine};
pub use crate::error::{Error, FieldError, Result, ValidationFailure};
pub use crate::form::{Form, FormBuilder, Targets, ValidationStateView};
pub use crate::options::FormOptions;
pub use crate::path::{FieldKey, FieldPath, PathSegment, Resolution, normalize};
pub use crate::rule::{
    CustomValidator, Rule, RuleSet, RuleSource, RuleType, RuleViolation, Trigger,
};
pub use crate::state::{ValidateStatus, ValidationInfo, merge_validation_info};
pub use crate::store::{ModelStore, Observer, SharedModel, Subscription};
