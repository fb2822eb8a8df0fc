//! Integration tests for formwork-validator
//!
//! End-to-end scenarios against the in-memory model:
//! - Field validation outcomes and the callback contract
//! - Deep path discovery, cascades and garbage collection
//! - Rule changes, reset and dispose
//! - Change-driven and debounced validation
//! - Path properties

mod lifecycle;
mod properties;
mod validation;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use formwork_validator::prelude::*;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

/// Builds a form over a fresh shared model.
pub fn form_over(model: Value, rules: Value, options: FormOptions) -> (Arc<SharedModel>, Form) {
    let store = SharedModel::shared(model);
    let form = Form::builder(store.clone())
        .rules(RuleSource::from_json(rules).expect("rules deserialize"))
        .options(options)
        .build()
        .expect("form builds");
    (store, form)
}

/// Options with change-driven validation off, for tests that drive
/// validation explicitly.
pub fn manual() -> FormOptions {
    FormOptions::new().with_validate_on_change(false)
}

/// Lets spawned validation tasks run to completion.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Records every `on_validate` call.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<(String, bool)>>>);

impl Recorder {
    pub fn hook(&self) -> impl Fn(&str, bool, Option<&ValidationFailure>) + Send + Sync + 'static {
        let calls = Arc::clone(&self.0);
        move |path: &str, ok: bool, _: Option<&ValidationFailure>| {
            calls.lock().push((path.to_owned(), ok));
        }
    }

    pub fn calls(&self) -> Vec<(String, bool)> {
        self.0.lock().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.0.lock().iter().filter(|(p, _)| p == path).count()
    }
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Engine that always fails to run.
pub struct FaultyEngine;

#[async_trait]
impl RuleEngine for FaultyEngine {
    async fn check(&self, _request: CheckRequest) -> std::result::Result<(), Rejection> {
        Err(Rejection::Fault("engine offline".into()))
    }
}

/// Holds every check until the gate is opened, then delegates to `inner`.
pub struct GatedEngine<E> {
    pub gate: Arc<Notify>,
    pub inner: E,
}

#[async_trait]
impl<E: RuleEngine> RuleEngine for GatedEngine<E> {
    async fn check(&self, request: CheckRequest) -> std::result::Result<(), Rejection> {
        self.gate.notified().await;
        self.inner.check(request).await
    }
}
