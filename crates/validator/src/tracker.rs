//! Change tracking: one store subscription per path, and a per-path
//! debouncer for the validations they trigger.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::path::FieldPath;
use crate::store::{ModelStore, Observer, Subscription};

/// Active store subscriptions keyed by path.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    subscriptions: HashMap<FieldPath, Subscription>,
}

impl ChangeTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Watches every path that is not already tracked. Returns how many new
    /// subscriptions were made.
    pub fn subscribe<I, F>(
        &mut self,
        store: &dyn ModelStore,
        paths: I,
        mut make_observer: F,
    ) -> usize
    where
        I: IntoIterator<Item = FieldPath>,
        F: FnMut(&FieldPath) -> Observer,
    {
        let mut added = 0;
        for path in paths {
            if self.subscriptions.contains_key(&path) {
                continue;
            }
            let observer = make_observer(&path);
            let subscription = store.watch(FieldPath::clone(&path), observer);
            tracing::debug!(path = %path, "Subscribed to field changes");
            self.subscriptions.insert(path, subscription);
            added += 1;
        }
        added
    }

    /// Tears down the subscription for one path.
    pub fn unsubscribe(&mut self, path: &str) -> bool {
        match self.subscriptions.remove(path) {
            Some(subscription) => {
                subscription.cancel();
                tracing::debug!(path, "Unsubscribed from field changes");
                true
            }
            None => false,
        }
    }

    /// True when `path` has an active subscription.
    pub fn is_tracked(&self, path: &str) -> bool {
        self.subscriptions.contains_key(path)
    }

    /// Tracked paths, sorted.
    pub fn paths(&self) -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = self.subscriptions.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Drops every subscription.
    pub fn clear(&mut self) {
        for (_, subscription) in self.subscriptions.drain() {
            subscription.cancel();
        }
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[derive(Debug, Default)]
struct Tickets {
    next: u64,
    latest: HashMap<FieldPath, u64>,
}

/// Delays jobs per path; a newer job for a path supersedes the pending one
/// for that path only.
///
/// Tickets are unique for the lifetime of the debouncer, so a job scheduled
/// before [`cancel_pending`](Self::cancel_pending) can never match a ticket
/// issued after it.
#[derive(Debug)]
pub struct Debouncer {
    wait: Duration,
    tickets: Arc<Mutex<Tickets>>,
    shutdown: CancellationToken,
}

impl Debouncer {
    /// Debouncer with a fixed delay.
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            tickets: Arc::new(Mutex::new(Tickets::default())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Configured delay.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Runs `job` after the delay unless another job for the same path is
    /// scheduled first, pending jobs are cancelled, or the debouncer is shut
    /// down.
    pub fn schedule<F>(&self, runtime: &Handle, path: FieldPath, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return;
        }

        let ticket = {
            let mut tickets = self.tickets.lock();
            tickets.next += 1;
            let ticket = tickets.next;
            tickets.latest.insert(FieldPath::clone(&path), ticket);
            ticket
        };
        tracing::trace!(
            path = %path,
            ticket,
            wait_ms = self.wait.as_millis() as u64,
            "Debounce scheduled"
        );

        let tickets = Arc::clone(&self.tickets);
        let shutdown = self.shutdown.clone();
        let wait = self.wait;
        runtime.spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => return,
                () = tokio::time::sleep(wait) => {}
            }

            let current = {
                let mut tickets = tickets.lock();
                let current = tickets.latest.get(&path) == Some(&ticket);
                if current {
                    tickets.latest.remove(&path);
                }
                current
            };
            if current {
                job.await;
            } else {
                tracing::trace!(path = %path, ticket, "Debounce superseded");
            }
        });
    }

    /// Number of paths with a pending job.
    pub fn pending(&self) -> usize {
        self.tickets.lock().latest.len()
    }

    /// Drops every pending job.
    pub fn cancel_pending(&self) {
        self.tickets.lock().latest.clear();
    }

    /// Drops pending jobs and refuses new ones.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.cancel_pending();
    }

    /// True after [`shutdown`](Self::shutdown).
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
