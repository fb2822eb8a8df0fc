//! Deep-rule expansion and the registry of discovered deep paths

use std::collections::HashMap;

use super::{Rule, RuleIndex, is_deep_rule};
use crate::path::{self, FieldPath};

/// Synthesizes the effective rules for a path nobody declared.
///
/// Every declared proper prefix of `path` is expanded over the remaining
/// segments: at each step the candidate rules that are deep contribute their
/// `default_field` rules and the `fields` entry named by the next segment.
/// A branch that runs out of deep rules before the last segment contributes
/// nothing. Expansions from several declared prefixes are concatenated,
/// shortest prefix first.
pub fn resolve_deep(path: &str, index: &RuleIndex) -> Vec<Rule> {
    let segments = path::split(path);
    let mut resolved = Vec::new();

    for depth in 1..segments.len() {
        let prefix = segments[..depth].join(".");
        let Some(declared) = index.get(&prefix) else {
            continue;
        };

        let mut candidates: Vec<Rule> = declared.to_vec();
        for segment in &segments[depth..] {
            let mut next = Vec::new();
            for rule in candidates.iter().filter(|rule| is_deep_rule(rule)) {
                if let Some(default_field) = &rule.default_field {
                    next.extend(default_field.to_vec());
                }
                if let Some(field) = rule.fields.as_ref().and_then(|f| f.get(*segment)) {
                    next.extend(field.to_vec());
                }
            }
            candidates = next;
            if candidates.is_empty() {
                break;
            }
        }
        resolved.extend(candidates);
    }

    resolved
}

/// Deep paths that have been looked up, and whether they produced rules.
#[derive(Debug, Clone, Default)]
pub struct DeepRegistry {
    entries: HashMap<FieldPath, bool>,
}

impl DeepRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a lookup.
    pub fn mark(&mut self, path: FieldPath, resolved: bool) {
        self.entries.insert(path, resolved);
    }

    /// `None` when never checked, else whether rules were found.
    pub fn state(&self, path: &str) -> Option<bool> {
        self.entries.get(path).copied()
    }

    /// True when `path` was checked and produced rules.
    pub fn is_resolved(&self, path: &str) -> bool {
        self.state(path) == Some(true)
    }

    /// Paths that produced rules.
    pub fn resolved(&self) -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = self
            .entries
            .iter()
            .filter(|(_, resolved)| **resolved)
            .map(|(path, _)| FieldPath::clone(path))
            .collect();
        paths.sort();
        paths
    }

    /// Resolved paths strictly below `base`.
    pub fn descendants_of(&self, base: &str) -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = self
            .entries
            .iter()
            .filter(|(path, resolved)| **resolved && path::is_descendant(path, base))
            .map(|(path, _)| FieldPath::clone(path))
            .collect();
        paths.sort();
        paths
    }

    /// Forgets one path.
    pub fn remove(&mut self, path: &str) -> Option<bool> {
        self.entries.remove(path)
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of checked paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was checked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
