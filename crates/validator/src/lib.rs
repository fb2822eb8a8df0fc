//! # formwork-validator
//!
//! Reactive form validation over a `serde_json::Value` model.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use formwork_validator::prelude::*;
//! use serde_json::json;
//!
//! let model = SharedModel::shared(json!({ "name": "", "items": [{ "name": "" }] }));
//! let rules = RuleSource::from_json(json!({
//!     "name": { "required": true, "message": "name is required" },
//!     "items": {
//!         "type": "array",
//!         "defaultField": {
//!             "type": "object",
//!             "fields": { "name": { "required": true, "message": "required" } }
//!         }
//!     }
//! }))?;
//!
//! let form = Form::builder(model.clone())
//!     .rules(rules)
//!     .options(FormOptions::new().with_deep(true))
//!     .build()?;
//!
//! // Deep paths are discovered on first access.
//! assert!(form.validation_info("items[0].name").unwrap().required);
//!
//! let passed = form
//!     .validate_with(|ok, failure| {
//!         if let Some(failure) = failure {
//!             for (path, errors) in &failure.fields {
//!                 println!("{path}: {}", errors[0].message);
//!             }
//!         }
//!         assert!(!ok);
//!     })
//!     .await?;
//! ```
//!
//! ## Pieces
//!
//! - [`path`]: canonical dot-paths and resolution against the model
//! - [`rule`]: declarative rules, the normalized [`RuleIndex`], deep expansion
//! - [`engine`]: the [`RuleEngine`] seam and the default [`BuiltinEngine`]
//! - [`store`]: the observable [`ModelStore`] and the in-memory [`SharedModel`]
//! - [`state`]: per-field [`ValidationInfo`]
//! - [`tracker`]: per-path subscriptions and debouncing
//! - [`form`]: the [`Form`] orchestrator

pub mod engine;
pub mod error;
pub mod form;
pub mod options;
pub mod path;
pub mod prelude;
pub mod rule;
pub mod state;
pub mod store;
pub mod tracker;

pub use engine::{BuiltinEngine, CheckRequest, Rejection, RuleEngine};
pub use error::{Error, FieldError, Result, ValidationFailure};
pub use form::{Form, FormBuilder, Targets, ValidationStateView};
pub use options::FormOptions;
pub use path::{FieldKey, FieldPath, PathSegment, Resolution, normalize};
pub use rule::{
    CustomValidator, Rule, RuleIndex, RuleSet, RuleSource, RuleType, RuleViolation, Trigger,
};
pub use state::{ValidateStatus, ValidationInfo, merge_validation_info};
pub use store::{ModelStore, SharedModel, Subscription};
