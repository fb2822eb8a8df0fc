//! Explicit validation: outcomes, aggregation and the callback contract.

use std::sync::Arc;

use formwork_validator::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use tokio::sync::Notify;

use crate::{FaultyEngine, GatedEngine, Recorder, form_over, manual, settle};

// ============================================================================
// OUTCOMES
// ============================================================================

#[tokio::test]
async fn repeated_validation_of_valid_value_stays_success() {
    let (_, form) = form_over(
        json!({"name": "ann"}),
        json!({"name": {"required": true}}),
        manual(),
    );

    for _ in 0..3 {
        assert!(form.validate().await.unwrap());
        let info = form.validation_info("name").unwrap();
        assert_eq!(info.validate_status, ValidateStatus::Success);
        assert_eq!(info.error, None);
    }
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn missing_key_depends_on_strict(#[case] strict: bool) {
    let (_, form) = form_over(
        json!({}),
        json!({"name": {"required": true, "message": "name is required"}}),
        manual().with_strict(strict),
    );

    let outcome = form.validate_field("name").await;
    if strict {
        let err = outcome.unwrap_err();
        let failure = err.as_validation().unwrap();
        assert_eq!(failure.first_message("name"), Some("name is required"));
        assert_eq!(form.validation_state().status("name"), ValidateStatus::Error);
    } else {
        assert!(outcome.unwrap());
        assert_eq!(form.validation_state().status("name"), ValidateStatus::None);
    }
}

#[tokio::test]
async fn missing_parent_is_skipped_even_when_strict() {
    let (_, form) = form_over(
        json!({}),
        json!({"user.name": {"required": true}}),
        manual().with_strict(true),
    );
    assert!(form.validate().await.unwrap());
    assert_eq!(form.validation_state().status("user.name"), ValidateStatus::None);
}

#[tokio::test]
async fn multi_field_validation_aggregates_every_failure() {
    let (_, form) = form_over(
        json!({"name": "", "email": "nope", "age": 30}),
        json!({
            "name": {"required": true, "message": "name is required"},
            "email": {"type": "email", "message": "bad email"},
            "age": {"type": "integer"}
        }),
        manual(),
    );

    let err = form
        .validate_field(["name", "email", "name"])
        .await
        .unwrap_err();
    let failure = err.as_validation().unwrap();

    let mut keys: Vec<&str> = failure.fields.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["email", "name"]);
    assert_eq!(failure.errors_for("name").len(), 1);
    assert_eq!(failure.first_message("email"), Some("bad email"));
    assert_eq!(form.validation_state().status("age"), ValidateStatus::None);
}

#[tokio::test]
async fn unknown_paths_are_skipped() {
    let (_, form) = form_over(json!({"a": 1}), json!({"a": {"required": true}}), manual());
    assert!(form.validate_field("ghost").await.unwrap());
    assert!(form.validation_info("ghost").is_none());
}

#[tokio::test]
async fn required_is_derived_from_any_rule_in_the_list() {
    let (_, form) = form_over(
        json!({}),
        json!({
            "name": [{"min": 2}, {"required": true}],
            "nick": {"min": 2}
        }),
        manual(),
    );
    assert!(form.validation_info("name").unwrap().required);
    assert!(!form.validation_info("nick").unwrap().required);
}

// ============================================================================
// CALLBACK CONTRACT
// ============================================================================

#[tokio::test]
async fn callback_receives_failure_and_call_resolves_false() {
    let (store, form) = form_over(
        json!({"name": ""}),
        json!({"name": {"required": true}}),
        manual(),
    );

    let mut seen = None;
    let passed = form
        .validate_with(|ok, failure| seen = Some((ok, failure.map(|f| f.fields.len()))))
        .await
        .unwrap();
    assert!(!passed);
    assert_eq!(seen, Some((false, Some(1))));

    store.set("name", json!("ann")).unwrap();
    let mut seen = None;
    let passed = form
        .validate_field_with("name", |ok, failure| seen = Some((ok, failure.is_some())))
        .await
        .unwrap();
    assert!(passed);
    assert_eq!(seen, Some((true, false)));
}

fn failing_rules() -> RuleSource {
    RuleSource::new().with(
        "name",
        Rule::new().with_validator(CustomValidator::new(|_| async {
            Err(RuleViolation::failed("lookup service down"))
        })),
    )
}

#[tokio::test]
async fn engine_fault_is_distinct_and_never_swallowed() {
    let store = SharedModel::shared(json!({"name": "ann"}));
    let form = Form::builder(store)
        .rules(failing_rules())
        .options(manual())
        .build()
        .unwrap();

    let err = form.validate().await.unwrap_err();
    assert!(err.is_engine());
    match &err {
        Error::Engine { path, value, message } => {
            assert_eq!(path, "name");
            assert_eq!(value, &json!("ann"));
            assert_eq!(message, "lookup service down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(form.validation_state().status("name"), ValidateStatus::None);

    let mut called = false;
    let outcome = form.validate_with(|_, _| called = true).await;
    assert!(outcome.unwrap_err().is_engine());
    assert!(!called);
}

#[tokio::test]
async fn custom_engine_faults_propagate() {
    let store = SharedModel::shared(json!({"name": "ann"}));
    let form = Form::builder(store)
        .rules(RuleSource::new().with("name", Rule::required()))
        .engine(FaultyEngine)
        .options(manual())
        .build()
        .unwrap();

    assert!(form.validate_field("name").await.unwrap_err().is_engine());
}

// ============================================================================
// STATUS TRANSITIONS
// ============================================================================

#[tokio::test]
async fn status_is_validating_while_engine_runs() {
    let gate = Arc::new(Notify::new());
    let store = SharedModel::shared(json!({"name": ""}));
    let form = Form::builder(store)
        .rules(RuleSource::new().with("name", Rule::required()))
        .engine(GatedEngine {
            gate: Arc::clone(&gate),
            inner: BuiltinEngine::new(),
        })
        .options(manual())
        .build()
        .unwrap();

    let running = tokio::spawn({
        let form = form.clone();
        async move { form.validate_field("name").await }
    });
    settle().await;
    assert_eq!(form.validation_state().status("name"), ValidateStatus::Validating);

    gate.notify_one();
    assert!(running.await.unwrap().unwrap_err().is_validation());
    let info = form.validation_info("name").unwrap();
    assert_eq!(info.validate_status, ValidateStatus::Error);
    assert_eq!(info.error.as_deref(), Some("name is required"));
}

#[tokio::test]
async fn hook_sees_every_engine_call() {
    let recorder = Recorder::default();
    let store = SharedModel::shared(json!({"a": "", "b": "x"}));
    let form = Form::builder(store)
        .rules(
            RuleSource::new()
                .with("a", Rule::required())
                .with("b", Rule::required()),
        )
        .options(manual())
        .on_validate(recorder.hook())
        .build()
        .unwrap();

    let _ = form.validate().await;
    let mut calls = recorder.calls();
    calls.sort();
    assert_eq!(calls, vec![("a".to_string(), false), ("b".to_string(), true)]);
}
