//! Form orchestration
//!
//! [`Form`] ties the pieces together: it normalizes a [`RuleSource`] into a
//! [`RuleIndex`], subscribes to every rule-bearing path on the
//! [`ModelStore`], runs the [`RuleEngine`] when asked (or when a watched
//! value changes) and keeps a [`ValidationState`] that UI bindings read.
//!
//! Under `deep` mode, paths that nobody declared (such as `items.3.name`)
//! get their rules on first access by expanding the container rules above
//! them. Validating a container also moves every already-discovered deep
//! path below it through the same status transitions.
//!
//! # Concurrency
//!
//! All bookkeeping sits behind one mutex that is never held across an
//! `.await`. Triggers for different paths run concurrently. Two triggers for
//! the same path race to completion and the last one to finish writes the
//! final status, even if it validated an older value.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;

use crate::engine::{BuiltinEngine, CheckRequest, Rejection, RuleEngine};
use crate::error::{Error, Result, ValidationFailure};
use crate::options::FormOptions;
use crate::path::{self, FieldKey, FieldPath, Resolution};
use crate::rule::{
    DeepRegistry, Rule, RuleIndex, RuleSource, Trigger, filter_by_trigger, is_required,
    resolve_deep,
};
use crate::state::{ValidateStatus, ValidationInfo, ValidationState};
use crate::store::{ModelStore, Observer};
use crate::tracker::{ChangeTracker, Debouncer};

/// Called after every engine-backed validation of a path with
/// `(path, passed, failure)`.
pub type ValidateHook = Arc<dyn Fn(&str, bool, Option<&ValidationFailure>) + Send + Sync>;

/// Deep-copy function used to snapshot the initial model.
pub type SnapshotFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Which paths an operation applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Targets {
    /// Every relevant path
    #[default]
    All,
    /// An explicit list of canonical paths
    Paths(Vec<FieldPath>),
}

impl Targets {
    /// Normalizes each key into a canonical path.
    pub fn paths<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<FieldKey>,
    {
        Self::Paths(keys.into_iter().map(path::normalize).collect())
    }
}

impl From<&str> for Targets {
    fn from(path: &str) -> Self {
        Self::paths([path])
    }
}

impl From<String> for Targets {
    fn from(path: String) -> Self {
        Self::paths([path])
    }
}

impl From<FieldPath> for Targets {
    fn from(path: FieldPath) -> Self {
        Self::paths([path])
    }
}

impl<K: Into<FieldKey>> From<Vec<K>> for Targets {
    fn from(keys: Vec<K>) -> Self {
        Self::paths(keys)
    }
}

impl<K: Into<FieldKey>, const N: usize> From<[K; N]> for Targets {
    fn from(keys: [K; N]) -> Self {
        Self::paths(keys)
    }
}

#[derive(Default)]
struct FormState {
    /// Declared rules plus deep paths resolved so far.
    index: RuleIndex,
    /// Declared rules only; deep expansion starts from these.
    declared_index: RuleIndex,
    declared: Vec<FieldPath>,
    infos: ValidationState,
    deep: DeepRegistry,
    tracker: ChangeTracker,
}

struct FormInner {
    store: Arc<dyn ModelStore>,
    engine: Arc<dyn RuleEngine>,
    options: FormOptions,
    initial: Value,
    snapshot: SnapshotFn,
    on_validate: Option<ValidateHook>,
    debouncer: Option<Debouncer>,
    state: Mutex<FormState>,
    disposed: AtomicBool,
    suppressed: AtomicUsize,
}

/// Reactive validator for one model and one rule source.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

/// Builder for [`Form`].
#[must_use = "builder does nothing until .build() is called"]
pub struct FormBuilder {
    store: Arc<dyn ModelStore>,
    rules: RuleSource,
    engine: Option<Arc<dyn RuleEngine>>,
    options: FormOptions,
    snapshot: Option<SnapshotFn>,
    on_validate: Option<ValidateHook>,
}

impl FormBuilder {
    /// Sets the declared rules.
    pub fn rules(mut self, rules: RuleSource) -> Self {
        self.rules = rules;
        self
    }

    /// Replaces the default [`BuiltinEngine`].
    pub fn engine(mut self, engine: impl RuleEngine + 'static) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Replaces the default engine with a shared one.
    pub fn shared_engine(mut self, engine: Arc<dyn RuleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the options.
    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the deep-copy function used for the initial snapshot.
    ///
    /// The default is [`Value::clone`].
    pub fn snapshot_with<F>(mut self, copy: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.snapshot = Some(Arc::new(copy));
        self
    }

    /// Registers a hook run after every engine-backed validation.
    pub fn on_validate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, bool, Option<&ValidationFailure>) + Send + Sync + 'static,
    {
        self.on_validate = Some(Arc::new(hook));
        self
    }

    /// Normalizes the rules, snapshots the model and subscribes to it.
    ///
    /// With `immediate` set, a full validation is spawned on the current
    /// tokio runtime.
    pub fn build(self) -> Result<Form> {
        self.options.validate()?;

        let snapshot: SnapshotFn = match self.snapshot {
            Some(copy) => copy,
            None => Arc::new(|value: &Value| value.clone()),
        };
        let engine: Arc<dyn RuleEngine> = match self.engine {
            Some(engine) => engine,
            None => Arc::new(BuiltinEngine::new()),
        };
        let initial = snapshot(&self.store.snapshot());
        let debouncer = self.options.debounce().map(Debouncer::new);

        let form = Form {
            inner: Arc::new(FormInner {
                store: self.store,
                engine,
                options: self.options,
                initial,
                snapshot,
                on_validate: self.on_validate,
                debouncer,
                state: Mutex::new(FormState::default()),
                disposed: AtomicBool::new(false),
                suppressed: AtomicUsize::new(0),
            }),
        };
        form.reconcile(&self.rules);

        if form.inner.options.immediate {
            match Handle::try_current() {
                Ok(runtime) => {
                    let form = form.clone();
                    runtime.spawn(async move {
                        form.log_outcome("*", form.validate().await);
                    });
                }
                Err(_) => tracing::warn!("No tokio runtime; immediate validation skipped"),
            }
        }

        Ok(form)
    }
}

impl Form {
    /// Starts building a form over `store`.
    pub fn builder(store: Arc<dyn ModelStore>) -> FormBuilder {
        FormBuilder {
            store,
            rules: RuleSource::new(),
            engine: None,
            options: FormOptions::default(),
            snapshot: None,
            on_validate: None,
        }
    }

    /// Options the form was built with.
    pub fn options(&self) -> &FormOptions {
        &self.inner.options
    }

    /// Model as it was when the form was built.
    pub fn initial_model(&self) -> Value {
        self.inner.initial.clone()
    }

    /// True after [`dispose`](Self::dispose).
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Declared paths, in declaration order.
    pub fn declared_paths(&self) -> Vec<FieldPath> {
        self.inner.state.lock().declared.clone()
    }

    /// Effective rules for a path, declared or deep-resolved.
    pub fn rules_for(&self, key: impl Into<FieldKey>) -> Option<Vec<Rule>> {
        let path = path::normalize(key);
        self.inner.state.lock().index.get(&path).map(<[Rule]>::to_vec)
    }

    /// True when the path has a store subscription.
    pub fn is_tracked(&self, key: impl Into<FieldKey>) -> bool {
        let path = path::normalize(key);
        self.inner.state.lock().tracker.is_tracked(&path)
    }

    /// Read-only view of the validation state.
    pub fn validation_state(&self) -> ValidationStateView<'_> {
        ValidationStateView { form: self }
    }

    /// Status of one path.
    ///
    /// Under `deep` mode an unknown path is resolved against the container
    /// rules above it on first access. A path that resolves to rules gets a
    /// state entry and a subscription; one that does not is remembered and
    /// answers `None` from then on.
    pub fn validation_info(&self, key: impl Into<FieldKey>) -> Option<ValidationInfo> {
        let path = path::normalize(key);
        let mut state = self.inner.state.lock();
        if let Some(info) = state.infos.get(&path) {
            return Some(info.clone());
        }
        if self.ensure_rules_locked(&mut state, &path) {
            state.infos.get(&path).cloned()
        } else {
            None
        }
    }

    /// Validates every declared path.
    ///
    /// Deep paths are only covered through the containers they belong to.
    pub async fn validate(&self) -> Result<bool> {
        self.validate_field(Targets::All).await
    }

    /// [`validate`](Self::validate) with a completion callback.
    ///
    /// A validation failure is handed to the callback and reported as
    /// `Ok(false)`. Engine faults still return `Err`.
    pub async fn validate_with<F>(&self, callback: F) -> Result<bool>
    where
        F: FnOnce(bool, Option<&ValidationFailure>),
    {
        settle(self.validate().await, callback)
    }

    /// Validates the given paths concurrently and aggregates every failure.
    ///
    /// Paths without rules are skipped. Engine faults take precedence over
    /// validation failures.
    pub async fn validate_field(&self, targets: impl Into<Targets>) -> Result<bool> {
        if self.is_disposed() {
            return Ok(true);
        }

        let paths = match targets.into() {
            Targets::All => self.declared_paths(),
            Targets::Paths(paths) => {
                let mut state = self.inner.state.lock();
                let mut known: Vec<FieldPath> = Vec::with_capacity(paths.len());
                for path in paths {
                    if !known.contains(&path) && self.ensure_rules_locked(&mut state, &path) {
                        known.push(path);
                    }
                }
                known
            }
        };

        let outcomes = join_all(
            paths
                .into_iter()
                .map(|path| self.run_trigger(path, None, None)),
        )
        .await;

        let mut failure = ValidationFailure::new();
        for outcome in outcomes {
            match outcome {
                Ok(_) => {}
                Err(Error::Validation(found)) => failure.merge(found),
                Err(other) => return Err(other),
            }
        }

        if failure.is_empty() {
            Ok(true)
        } else {
            Err(Error::Validation(failure))
        }
    }

    /// [`validate_field`](Self::validate_field) with a completion callback.
    pub async fn validate_field_with<F>(
        &self,
        targets: impl Into<Targets>,
        callback: F,
    ) -> Result<bool>
    where
        F: FnOnce(bool, Option<&ValidationFailure>),
    {
        settle(self.validate_field(targets).await, callback)
    }

    /// Validates one path, optionally with an already-resolved value and a
    /// trigger that filters the rules.
    ///
    /// An absent value clears the path instead (unless `strict` is set and
    /// only the last segment is missing).
    pub async fn trigger_validate(
        &self,
        key: impl Into<FieldKey>,
        precomputed: Option<Resolution>,
        trigger: Option<Trigger>,
    ) -> Result<bool> {
        if self.is_disposed() {
            return Ok(true);
        }
        let path = path::normalize(key);
        let known = {
            let mut state = self.inner.state.lock();
            self.ensure_rules_locked(&mut state, &path)
        };
        if !known {
            return Ok(true);
        }
        self.run_trigger(path, precomputed, trigger).await
    }

    /// Resets status and error to `none`, cascading to deep descendants.
    pub fn clear_validate(&self, targets: impl Into<Targets>) {
        if self.is_disposed() {
            return;
        }
        let mut state = self.inner.state.lock();
        let paths = match targets.into() {
            Targets::All => state
                .infos
                .iter()
                .map(|(path, _)| FieldPath::clone(path))
                .collect(),
            Targets::Paths(paths) => paths,
        };
        for path in &paths {
            state.infos.reset(path);
            for descendant in state.deep.descendants_of(path) {
                state.infos.reset(&descendant);
            }
        }
    }

    /// Removes deep paths whose value has disappeared.
    ///
    /// Candidates are the resolved deep paths equal to or below `targets`.
    /// A removed path loses its state entry, subscription, rules and
    /// registry entry, so a later access derives it from scratch. Returns
    /// how many paths were removed.
    pub fn clear_deep_validation(
        &self,
        targets: impl Into<Targets>,
        strict: Option<bool>,
    ) -> usize {
        if self.is_disposed() {
            return 0;
        }
        let strict = strict.unwrap_or(self.inner.options.strict);
        let targets = targets.into();

        let candidates: Vec<FieldPath> = {
            let state = self.inner.state.lock();
            state
                .deep
                .resolved()
                .into_iter()
                .filter(|candidate| match &targets {
                    Targets::All => true,
                    Targets::Paths(bases) => bases.iter().any(|base| {
                        base == candidate || path::is_descendant(candidate, base)
                    }),
                })
                .collect()
        };

        let gone: Vec<FieldPath> = candidates
            .into_iter()
            .filter(|path| is_vacant(&self.inner.store.resolve(path), strict))
            .collect();

        let mut state = self.inner.state.lock();
        for path in &gone {
            state.infos.remove(path);
            state.tracker.unsubscribe(path);
            state.index.remove(path);
            state.deep.remove(path);
            tracing::debug!(path = %path, "Removed stale deep path");
        }
        gone.len()
    }

    /// Replaces the rule source and reconciles subscriptions and state.
    ///
    /// With `validate_on_rule_change`, the form is revalidated afterwards;
    /// validation failures are recorded in the state only, engine faults
    /// are returned.
    pub async fn set_rules(&self, rules: RuleSource) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        self.reconcile(&rules);

        if self.inner.options.validate_on_rule_change {
            match self.validate().await {
                Ok(_) => {}
                Err(Error::Validation(failure)) => {
                    tracing::debug!(
                        fields = failure.fields.len(),
                        "Revalidation after rule change found errors"
                    );
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// Restores the initial model field by field, with optional top-level
    /// overrides, then drops pending debounced validations and clears every
    /// status.
    ///
    /// Change notifications delivered while the fields are written do not
    /// trigger validation.
    pub fn reset_fields(&self, overrides: Option<Value>) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }

        let mut target = (self.inner.snapshot)(&self.inner.initial);
        match (&mut target, overrides) {
            (_, None) => {}
            (Value::Object(fields), Some(Value::Object(extra))) => fields.extend(extra),
            (_, Some(_)) => {
                return Err(Error::model("", "reset override must be an object"));
            }
        }

        {
            let _quiet = Suppressed::enter(&self.inner.suppressed);
            match target {
                Value::Object(fields) => {
                    for (key, value) in fields {
                        self.inner.store.set(&key, value)?;
                    }
                }
                other => self.inner.store.set("", other)?,
            }
        }

        if let Some(debouncer) = &self.inner.debouncer {
            debouncer.cancel_pending();
        }
        self.clear_validate(Targets::All);
        tracing::debug!("Form fields reset");
        Ok(())
    }

    /// Drops every subscription and pending debounced validation.
    ///
    /// Idempotent. Later operations are no-ops that report success.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(debouncer) = &self.inner.debouncer {
            debouncer.shutdown();
        }
        self.inner.state.lock().tracker.clear();
        tracing::debug!("Form disposed");
    }

    fn reconcile(&self, source: &RuleSource) {
        let index = RuleIndex::normalize(source);
        let declared: Vec<FieldPath> = index.paths().cloned().collect();

        let mut state = self.inner.state.lock();
        let mut stale: Vec<FieldPath> = state
            .infos
            .iter()
            .map(|(path, _)| FieldPath::clone(path))
            .chain(state.tracker.paths())
            .filter(|path| !index.contains(path))
            .collect();
        stale.sort();
        stale.dedup();
        for path in &stale {
            state.infos.remove(path);
            state.tracker.unsubscribe(path);
        }

        for (path, rules) in index.iter() {
            state.infos.register(FieldPath::clone(path), is_required(rules));
        }
        state.deep.clear();
        state.declared_index = index.clone();
        state.index = index;
        state.declared = declared.clone();
        let added = self.subscribe_locked(&mut state, declared);

        tracing::debug!(
            declared = state.declared.len(),
            subscribed = added,
            removed = stale.len(),
            "Rules reconciled"
        );
    }

    /// True when `path` has rules, resolving deep rules on first access.
    fn ensure_rules_locked(&self, state: &mut FormState, path: &FieldPath) -> bool {
        if state.index.contains(path) {
            return true;
        }
        if !self.inner.options.deep || state.deep.state(path).is_some() {
            return false;
        }

        let rules = resolve_deep(path, &state.declared_index);
        if rules.is_empty() {
            state.deep.mark(FieldPath::clone(path), false);
            tracing::debug!(path = %path, "No deep rules for path");
            return false;
        }

        state.infos.register(FieldPath::clone(path), is_required(&rules));
        state.index.insert(FieldPath::clone(path), rules);
        state.deep.mark(FieldPath::clone(path), true);
        self.subscribe_locked(state, [FieldPath::clone(path)]);
        tracing::debug!(path = %path, "Resolved deep rules");
        true
    }

    fn subscribe_locked<I>(&self, state: &mut FormState, paths: I) -> usize
    where
        I: IntoIterator<Item = FieldPath>,
    {
        let form = Arc::downgrade(&self.inner);
        state
            .tracker
            .subscribe(self.inner.store.as_ref(), paths, |path| {
                change_observer(Weak::clone(&form), FieldPath::clone(path))
            })
    }

    fn on_change(&self, path: FieldPath, resolution: Resolution) {
        if self.is_disposed()
            || self.inner.suppressed.load(Ordering::Acquire) > 0
            || !self.inner.options.validate_on_change
        {
            return;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(path = %path, "No tokio runtime; change ignored");
                return;
            }
        };

        let form = self.clone();
        let job_path = FieldPath::clone(&path);
        let job = async move {
            let outcome = form
                .run_trigger(
                    FieldPath::clone(&job_path),
                    Some(resolution),
                    Some(Trigger::Change),
                )
                .await;
            form.log_outcome(&job_path, outcome);
        };

        match &self.inner.debouncer {
            Some(debouncer) => debouncer.schedule(&runtime, path, job),
            None => {
                runtime.spawn(job);
            }
        }
    }

    async fn run_trigger(
        &self,
        path: FieldPath,
        precomputed: Option<Resolution>,
        trigger: Option<Trigger>,
    ) -> Result<bool> {
        let resolution = precomputed.unwrap_or_else(|| self.inner.store.resolve(&path));

        let (rules, cascade) = {
            let mut state = self.inner.state.lock();
            let Some(declared) = state.index.get(&path) else {
                return Ok(true);
            };
            let rules = match trigger {
                Some(trigger) => filter_by_trigger(declared, trigger),
                None => declared.to_vec(),
            };
            let cascade = state.deep.descendants_of(&path);

            if is_vacant(&resolution, self.inner.options.strict) {
                state.infos.reset(&path);
                for descendant in &cascade {
                    state.infos.reset(descendant);
                }
                tracing::debug!(
                    path = %path,
                    missing_depth = resolution.missing_depth,
                    "Field absent; cleared"
                );
                return Ok(true);
            }
            if rules.is_empty() {
                return Ok(true);
            }

            state.infos.set(&path, ValidateStatus::Validating, None);
            for descendant in &cascade {
                state.infos.set(descendant, ValidateStatus::Validating, None);
            }
            (rules, cascade)
        };

        let value = resolution.value_or_null();
        let outcome = self
            .inner
            .engine
            .check(CheckRequest::single(path.to_string(), rules, value.clone()))
            .await;

        let result = {
            let mut state = self.inner.state.lock();
            let touched = std::iter::once(&path).chain(cascade.iter());
            match outcome {
                Ok(()) => {
                    for field in touched {
                        state.infos.set(field, ValidateStatus::Success, None);
                    }
                    Ok(true)
                }
                Err(Rejection::Invalid(failure)) => {
                    for field in touched {
                        match failure.first_message(field) {
                            Some(message) => {
                                state.infos.set(
                                    field,
                                    ValidateStatus::Error,
                                    Some(message.to_owned()),
                                );
                            }
                            None => state.infos.set(field, ValidateStatus::Success, None),
                        }
                    }
                    Err(Error::Validation(failure))
                }
                Err(Rejection::Fault(message)) => {
                    for field in touched {
                        state.infos.reset(field);
                    }
                    tracing::warn!(path = %path, error = %message, "Rule engine failed");
                    Err(Error::Engine {
                        path: path.to_string(),
                        value,
                        message,
                    })
                }
            }
        };

        if let Some(hook) = &self.inner.on_validate {
            match &result {
                Ok(_) => hook(&*path, true, None),
                Err(error) => hook(&*path, false, error.as_validation()),
            }
        }
        tracing::debug!(path = %path, passed = result.is_ok(), "Field validated");
        result
    }

    fn log_outcome(&self, path: &str, outcome: Result<bool>) {
        match outcome {
            Ok(_) => {}
            Err(Error::Validation(failure)) => {
                tracing::debug!(path, fields = failure.fields.len(), "Validation found errors");
            }
            Err(error) => tracing::warn!(path, error = %error, "Validation failed to run"),
        }
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Form")
            .field("options", &self.inner.options)
            .field("declared", &state.declared)
            .field("tracked", &state.tracker.len())
            .field("deep", &state.deep.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Read-only projection of a form's validation state.
#[derive(Debug, Clone, Copy)]
pub struct ValidationStateView<'a> {
    form: &'a Form,
}

impl ValidationStateView<'_> {
    /// Same as [`Form::validation_info`].
    pub fn get(&self, key: impl Into<FieldKey>) -> Option<ValidationInfo> {
        self.form.validation_info(key)
    }

    /// Status of a path, `none` when unknown.
    pub fn status(&self, key: impl Into<FieldKey>) -> ValidateStatus {
        self.get(key)
            .map(|info| info.validate_status)
            .unwrap_or_default()
    }

    /// Every entry that exists right now, without resolving anything.
    pub fn snapshot(&self) -> indexmap::IndexMap<String, ValidationInfo> {
        self.form.inner.state.lock().infos.snapshot()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.form.inner.state.lock().infos.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mutes change observers while a reset writes the model.
///
/// Nested and concurrent resets each hold a guard; observers stay muted
/// until the last one drops. Changes written by other threads while any
/// reset is in progress are dropped as well.
struct Suppressed<'a>(&'a AtomicUsize);

impl<'a> Suppressed<'a> {
    fn enter(depth: &'a AtomicUsize) -> Self {
        depth.fetch_add(1, Ordering::AcqRel);
        Self(depth)
    }
}

impl Drop for Suppressed<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn change_observer(form: Weak<FormInner>, path: FieldPath) -> Observer {
    Arc::new(move |resolution: &Resolution| {
        if let Some(inner) = form.upgrade() {
            Form { inner }.on_change(FieldPath::clone(&path), resolution.clone());
        }
    })
}

/// Absent values are skipped unless `strict` asks to validate a key that
/// is missing from a parent that exists.
fn is_vacant(resolution: &Resolution, strict: bool) -> bool {
    !resolution.exists() && (!strict || resolution.is_deep_miss())
}

fn settle<F>(result: Result<bool>, callback: F) -> Result<bool>
where
    F: FnOnce(bool, Option<&ValidationFailure>),
{
    match result {
        Ok(_) => {
            callback(true, None);
            Ok(true)
        }
        Err(Error::Validation(failure)) => {
            callback(false, Some(&failure));
            Ok(false)
        }
        Err(other) => Err(other),
    }
}
