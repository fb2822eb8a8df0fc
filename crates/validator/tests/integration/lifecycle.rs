//! Construction, rule changes, reset and dispose.

use std::time::Duration;

use formwork_validator::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{Recorder, form_over, manual, settle};

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn build_rejects_invalid_options() {
    let store = SharedModel::shared(json!({}));
    let err = Form::builder(store)
        .options(FormOptions::new().with_debounce(Duration::from_secs(300)))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn build_subscribes_every_declared_path() {
    let (store, form) = form_over(
        json!({"a": 1}),
        json!({"a": {"required": true}, "b[0]": {"type": "string"}}),
        manual(),
    );
    assert_eq!(store.watcher_count(), 2);
    assert_eq!(
        form.declared_paths(),
        vec![FieldPath::from("a"), FieldPath::from("b.0")]
    );
    assert!(form.is_tracked("b.0"));
}

#[tokio::test]
async fn immediate_validates_after_build() {
    let (_, form) = form_over(
        json!({"name": ""}),
        json!({"name": {"required": true}}),
        manual().with_immediate(true),
    );
    settle().await;
    assert_eq!(form.validation_state().status("name"), ValidateStatus::Error);
}

#[test]
fn snapshot_function_shapes_the_initial_model() {
    let store = SharedModel::shared(json!({"name": "ann", "token": "secret"}));
    let form = Form::builder(store)
        .snapshot_with(|model| {
            let mut copy = model.clone();
            if let Some(fields) = copy.as_object_mut() {
                fields.remove("token");
            }
            copy
        })
        .build()
        .unwrap();
    assert_eq!(form.initial_model(), json!({"name": "ann"}));
}

// ============================================================================
// RESET
// ============================================================================

#[tokio::test]
async fn reset_restores_initial_snapshot_and_clears_status() {
    let (store, form) = form_over(
        json!({"name": "ann", "age": 3, "tags": ["a"]}),
        json!({"name": {"required": true}, "age": {"type": "integer", "min": 5}}),
        manual(),
    );

    store.set("name", json!("")).unwrap();
    store.set("tags.1", json!("b")).unwrap();
    let _ = form.validate().await;
    assert_eq!(form.validation_state().status("name"), ValidateStatus::Error);
    assert_eq!(form.validation_state().status("age"), ValidateStatus::Error);

    form.reset_fields(None).unwrap();
    assert_eq!(store.snapshot(), form.initial_model());
    assert_eq!(store.snapshot(), json!({"name": "ann", "age": 3, "tags": ["a"]}));
    for (_, info) in form.validation_state().snapshot() {
        assert_eq!(info.validate_status, ValidateStatus::None);
        assert_eq!(info.error, None);
    }
}

#[test]
fn reset_applies_top_level_overrides() {
    let (store, form) = form_over(json!({"name": "ann", "age": 3}), json!({}), manual());
    store.set("age", json!(9)).unwrap();

    form.reset_fields(Some(json!({"name": "bob"}))).unwrap();
    assert_eq!(store.snapshot(), json!({"name": "bob", "age": 3}));
}

#[test]
fn reset_rejects_non_object_override() {
    let (_, form) = form_over(json!({"name": "ann"}), json!({}), manual());
    let err = form.reset_fields(Some(json!([1, 2]))).unwrap_err();
    assert!(matches!(err, Error::Model { .. }));
}

#[tokio::test]
async fn reset_writes_do_not_trigger_validation() {
    let recorder = Recorder::default();
    let store = SharedModel::shared(json!({"name": "ann"}));
    let form = Form::builder(store.clone())
        .rules(RuleSource::new().with("name", Rule::required()))
        .on_validate(recorder.hook())
        .build()
        .unwrap();

    store.set("name", json!("")).unwrap();
    settle().await;
    assert_eq!(recorder.count("name"), 1);

    form.reset_fields(None).unwrap();
    settle().await;
    assert_eq!(recorder.count("name"), 1);
    assert_eq!(form.validation_state().status("name"), ValidateStatus::None);
}

// ============================================================================
// RULE CHANGES
// ============================================================================

#[tokio::test]
async fn set_rules_reconciles_paths() {
    let (store, form) = form_over(
        json!({"name": "", "email": "x"}),
        json!({"name": {"required": true}, "email": {"type": "email"}}),
        manual().with_validate_on_rule_change(false),
    );
    let _ = form.validate().await;

    form.set_rules(
        RuleSource::new()
            .with("name", Rule::new().with_min(1.0))
            .with("phone", Rule::required()),
    )
    .await
    .unwrap();

    let name = form.validation_info("name").unwrap();
    assert!(!name.required);
    assert_eq!(name.validate_status, ValidateStatus::Error);

    assert!(form.validation_info("email").is_none());
    assert!(!form.is_tracked("email"));

    let phone = form.validation_info("phone").unwrap();
    assert!(phone.required);
    assert_eq!(phone.validate_status, ValidateStatus::None);
    assert!(form.is_tracked("phone"));
    assert_eq!(store.watcher_count(), 2);
}

#[tokio::test]
async fn set_rules_revalidates_when_enabled() {
    let (_, form) = form_over(json!({"name": "", "nick": "x"}), json!({}), manual());

    form.set_rules(
        RuleSource::new()
            .with("name", Rule::required())
            .with("nick", Rule::required()),
    )
    .await
    .unwrap();

    assert_eq!(form.validation_state().status("name"), ValidateStatus::Error);
    assert_eq!(form.validation_state().status("nick"), ValidateStatus::Success);
}

#[tokio::test]
async fn set_rules_forgets_deep_paths() {
    let rules = json!({
        "items": {"type": "array", "defaultField": {"type": "string", "min": 2}}
    });
    let (_, form) = form_over(
        json!({"items": ["abc"]}),
        rules.clone(),
        manual().with_deep(true).with_validate_on_rule_change(false),
    );
    assert!(form.validation_info("items.0").is_some());

    form.set_rules(RuleSource::from_json(rules).unwrap()).await.unwrap();
    assert!(!form.is_tracked("items.0"));
    assert!(form.rules_for("items.0").is_none());

    assert!(form.validation_info("items.0").is_some());
    assert!(form.is_tracked("items.0"));
}

// ============================================================================
// DISPOSE
// ============================================================================

#[tokio::test]
async fn dispose_is_idempotent_and_turns_operations_into_no_ops() {
    let recorder = Recorder::default();
    let store = SharedModel::shared(json!({"name": ""}));
    let form = Form::builder(store.clone())
        .rules(RuleSource::new().with("name", Rule::required()))
        .on_validate(recorder.hook())
        .build()
        .unwrap();

    form.dispose();
    form.dispose();
    assert!(form.is_disposed());
    assert_eq!(store.watcher_count(), 0);

    assert!(form.validate().await.unwrap());
    assert!(form.validate_field("name").await.unwrap());
    assert!(form.trigger_validate("name", None, None).await.unwrap());
    form.set_rules(RuleSource::new()).await.unwrap();
    form.reset_fields(None).unwrap();
    form.clear_validate(Targets::All);
    assert_eq!(form.clear_deep_validation(Targets::All, None), 0);

    store.set("name", json!("changed")).unwrap();
    settle().await;
    assert!(recorder.calls().is_empty());
}

#[test]
fn dropping_the_form_unsubscribes() {
    let (store, form) = form_over(json!({"a": 1}), json!({"a": {"required": true}}), manual());
    assert_eq!(store.watcher_count(), 1);
    drop(form);
    assert_eq!(store.watcher_count(), 0);
}
