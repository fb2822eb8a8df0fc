//! Observable model store
//!
//! The form never owns the data it validates. It reads and watches it
//! through [`ModelStore`]: a snapshot/resolve pair for reads, `set` for the
//! field-by-field writes of a reset, and `watch` for per-path change
//! notification. [`SharedModel`] is the in-memory implementation over
//! `serde_json::Value`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::path::{self, FieldPath, Resolution};

/// Callback fired with the new resolution of a watched path.
pub type Observer = Arc<dyn Fn(&Resolution) + Send + Sync>;

/// Handle for one registered observer.
///
/// Cancelling (or dropping) the handle unregisters the observer.
#[must_use = "dropping a subscription unregisters it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wraps the teardown for an observer.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to tear down.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Unregisters the observer now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Read/observe/write access to the form's data model.
pub trait ModelStore: Send + Sync {
    /// Current model as an owned value.
    fn snapshot(&self) -> Value;

    /// Resolves a canonical path against the current model.
    fn resolve(&self, path: &str) -> Resolution {
        path::resolve(&self.snapshot(), path)
    }

    /// Writes a value at a canonical path, creating missing objects.
    fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Registers an observer that fires whenever the value at `path`
    /// changes, including appearing or disappearing.
    fn watch(&self, path: FieldPath, observer: Observer) -> Subscription;
}

struct Watcher {
    path: FieldPath,
    last: Resolution,
    observer: Observer,
}

#[derive(Default)]
struct Watchers {
    next_id: u64,
    entries: HashMap<u64, Watcher>,
}

/// In-memory observable model.
///
/// Observers run synchronously on the writing thread, after every lock has
/// been released, so they may read the model again.
pub struct SharedModel {
    data: RwLock<Value>,
    watchers: Arc<Mutex<Watchers>>,
}

impl SharedModel {
    /// Wraps an initial model.
    pub fn new(initial: Value) -> Self {
        Self {
            data: RwLock::new(initial),
            watchers: Arc::new(Mutex::new(Watchers::default())),
        }
    }

    /// Convenience constructor returning a shareable handle.
    pub fn shared(initial: Value) -> Arc<Self> {
        Arc::new(Self::new(initial))
    }

    /// Clone of the value at a path.
    pub fn get(&self, path: &str) -> Option<Value> {
        path::resolve_ref(&self.data.read(), path).0.cloned()
    }

    /// Applies an arbitrary mutation, then notifies observers whose value
    /// changed.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut Value),
    {
        mutate(&mut self.data.write());
        self.notify();
    }

    /// Removes the value at a path (object key or array element).
    pub fn remove(&self, path: &str) -> Option<Value> {
        let removed = {
            let mut data = self.data.write();
            remove_at(&mut data, path)
        };
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    /// Number of registered observers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().entries.len()
    }

    fn notify(&self) {
        let fired: Vec<(Observer, Resolution)> = {
            let data = self.data.read();
            let mut watchers = self.watchers.lock();
            watchers
                .entries
                .values_mut()
                .filter_map(|watcher| {
                    let current = path::resolve(&data, &watcher.path);
                    (current != watcher.last).then(|| {
                        watcher.last = current.clone();
                        (Arc::clone(&watcher.observer), current)
                    })
                })
                .collect()
        };

        for (observer, resolution) in fired {
            observer(&resolution);
        }
    }
}

impl Default for SharedModel {
    fn default() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }
}

impl fmt::Debug for SharedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedModel")
            .field("data", &*self.data.read())
            .field("watchers", &self.watcher_count())
            .finish()
    }
}

impl ModelStore for SharedModel {
    fn snapshot(&self) -> Value {
        self.data.read().clone()
    }

    fn resolve(&self, path: &str) -> Resolution {
        path::resolve(&self.data.read(), path)
    }

    fn set(&self, path: &str, value: Value) -> Result<()> {
        {
            let mut data = self.data.write();
            write_at(&mut data, path, value)?;
        }
        self.notify();
        Ok(())
    }

    fn watch(&self, path: FieldPath, observer: Observer) -> Subscription {
        let last = self.resolve(&path);
        let id = {
            let mut watchers = self.watchers.lock();
            let id = watchers.next_id;
            watchers.next_id += 1;
            watchers.entries.insert(
                id,
                Watcher {
                    path,
                    last,
                    observer,
                },
            );
            id
        };

        let registry: Weak<Mutex<Watchers>> = Arc::downgrade(&self.watchers);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().entries.remove(&id);
            }
        })
    }
}

fn write_at(root: &mut Value, path: &str, value: Value) -> Result<()> {
    let segments = path::split(path);
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        if current.is_null() {
            *current = Value::Object(serde_json::Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry((*segment).to_owned())
                .or_insert_with(|| Value::Object(serde_json::Map::new())),
            Value::Array(items) => {
                let index = parse_index(path, segment, items.len())?;
                if index == items.len() {
                    items.push(Value::Object(serde_json::Map::new()));
                }
                &mut items[index]
            }
            _ => return Err(Error::model(path, format!("'{segment}' is not a container"))),
        };
    }

    if current.is_null() {
        *current = Value::Object(serde_json::Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert((*last).to_owned(), value);
        }
        Value::Array(items) => {
            let index = parse_index(path, last, items.len())?;
            if index == items.len() {
                items.push(value);
            } else {
                items[index] = value;
            }
        }
        _ => return Err(Error::model(path, "parent is not a container")),
    }
    Ok(())
}

fn parse_index(path: &str, segment: &str, len: usize) -> Result<usize> {
    let index = segment
        .parse::<usize>()
        .map_err(|_| Error::model(path, format!("'{segment}' is not an array index")))?;
    if index > len {
        return Err(Error::model(
            path,
            format!("index {index} is past the end of an array of {len}"),
        ));
    }
    Ok(index)
}

fn remove_at(root: &mut Value, path: &str) -> Option<Value> {
    let segments = path::split(path);
    let (last, parents) = segments.split_last()?;

    let mut current = root;
    for segment in parents {
        current = match current {
            Value::Object(map) => map.get_mut(*segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Object(map) => map.shift_remove(*last),
        Value::Array(items) => {
            let index = last.parse::<usize>().ok()?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}
