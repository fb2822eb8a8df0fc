//! Normalized per-path rule table

use indexmap::IndexMap;

use super::{Rule, RuleSource, RuleType, Trigger};
use crate::path::{self, FieldPath};

/// Rules keyed by canonical path, each normalized to an ordered list.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: IndexMap<FieldPath, Vec<Rule>>,
}

impl RuleIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalizes every declared key and wraps its rules into a list.
    pub fn normalize(source: &RuleSource) -> Self {
        let mut rules: IndexMap<FieldPath, Vec<Rule>> = IndexMap::with_capacity(source.len());
        for (key, set) in source.iter() {
            let canonical = path::normalize(key);
            // `a[0]` and `a.0` declared side by side land on one path.
            rules.entry(canonical).or_default().extend(set.to_vec());
        }
        Self { rules }
    }

    /// Rules for a path.
    pub fn get(&self, path: &str) -> Option<&[Rule]> {
        self.rules.get(path).map(Vec::as_slice)
    }

    /// True when the path has an entry (possibly empty).
    pub fn contains(&self, path: &str) -> bool {
        self.rules.contains_key(path)
    }

    /// Caches a derived rule list.
    pub fn insert(&mut self, path: FieldPath, rules: Vec<Rule>) {
        self.rules.insert(path, rules);
    }

    /// Drops the entry for a path.
    pub fn remove(&mut self, path: &str) -> Option<Vec<Rule>> {
        self.rules.shift_remove(path)
    }

    /// Indexed paths in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.rules.keys()
    }

    /// Paths with their rules.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &[Rule])> {
        self.rules.iter().map(|(p, r)| (p, r.as_slice()))
    }

    /// Number of indexed paths.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// True iff any rule in the list is `required`.
pub fn is_required(rules: &[Rule]) -> bool {
    rules.iter().any(|rule| rule.required)
}

/// True iff the rule is an object/array rule carrying nested declarations.
pub fn is_deep_rule(rule: &Rule) -> bool {
    rule.kind.is_some_and(RuleType::is_container)
        && (rule.fields.is_some() || rule.default_field.is_some())
}

/// Rules that run for `trigger`.
pub fn filter_by_trigger(rules: &[Rule], trigger: Trigger) -> Vec<Rule> {
    rules
        .iter()
        .filter(|rule| rule.admits(trigger))
        .cloned()
        .collect()
}
