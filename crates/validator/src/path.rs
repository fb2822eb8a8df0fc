//! Field paths: canonicalization and resolution against the model
//!
//! Every field is addressed by a canonical dot-path such as
//! `users.0.name`. Callers may hand in bracket notation (`users[0].name`),
//! a list of segments (`["users", 0, "name"]`) or a bare index; all of them
//! collapse to the same [`FieldPath`].

use std::fmt;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use serde_json::Value;
use smallvec::SmallVec;

/// Canonical dot-joined field path.
pub type FieldPath = Arc<str>;

/// One segment of a raw field key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A raw, not yet canonical field key.
///
/// Normalization is memoized by the exact raw key, so `"a[0]"` and `"a.0"`
/// are two cache entries that map to the same canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// Dotted or bracketed string
    Path(String),
    /// Explicit segment list
    Segments(Vec<PathSegment>),
    /// Single array index
    Index(usize),
}

impl From<&str> for FieldKey {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

impl From<String> for FieldKey {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<&String> for FieldKey {
    fn from(path: &String) -> Self {
        Self::Path(path.clone())
    }
}

impl From<&FieldPath> for FieldKey {
    fn from(path: &FieldPath) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<FieldPath> for FieldKey {
    fn from(path: FieldPath) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<usize> for FieldKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<S: Into<PathSegment>> From<Vec<S>> for FieldKey {
    fn from(segments: Vec<S>) -> Self {
        Self::Segments(segments.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<PathSegment>, const N: usize> From<[S; N]> for FieldKey {
    fn from(segments: [S; N]) -> Self {
        Self::Segments(segments.into_iter().map(Into::into).collect())
    }
}

/// Process-wide memo of raw key to canonical path, shared by every form.
///
/// Unbounded: entries are never evicted, so every distinct raw key seen
/// (including each `items.N.name` discovered under deep mode) stays
/// resident for the life of the process.
static NORMALIZED: LazyLock<DashMap<FieldKey, FieldPath>> = LazyLock::new(DashMap::new);

/// Converts any accepted key shape into its canonical dot-path.
///
/// Results are cached per raw key; a repeated call hands back the same
/// `Arc` instance. The cache is unbounded and never shrinks.
pub fn normalize(key: impl Into<FieldKey>) -> FieldPath {
    let key = key.into();
    if let Some(hit) = NORMALIZED.get(&key) {
        return Arc::clone(hit.value());
    }

    let canonical: FieldPath = Arc::from(canonicalize(&key));
    Arc::clone(NORMALIZED.entry(key).or_insert(canonical).value())
}

fn canonicalize(key: &FieldKey) -> String {
    match key {
        FieldKey::Index(index) => index.to_string(),
        FieldKey::Segments(segments) => segments
            .iter()
            .map(ToString::to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("."),
        FieldKey::Path(raw) => parse_segments(raw).join("."),
    }
}

/// Splits bracket/dot notation into plain segments. `a[0]["b"].c` yields
/// `a`, `0`, `b`, `c`.
fn parse_segments(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => flush(&mut segments, &mut current),
            '[' => {
                flush(&mut segments, &mut current);
                let mut inner = String::new();
                for ch in chars.by_ref() {
                    if ch == ']' {
                        break;
                    }
                    inner.push(ch);
                }
                let inner = inner.trim();
                let inner = inner
                    .strip_prefix(['"', '\''])
                    .and_then(|s| s.strip_suffix(['"', '\'']))
                    .unwrap_or(inner);
                if !inner.is_empty() {
                    segments.push(inner.to_owned());
                }
            }
            _ => current.push(ch),
        }
    }
    flush(&mut segments, &mut current);
    segments
}

fn flush(segments: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        segments.push(std::mem::take(current));
    }
}

/// Splits a canonical path into its segments.
pub fn split(path: &str) -> SmallVec<[&str; 8]> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

/// Appends a segment to a canonical path.
pub fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_owned()
    } else {
        format!("{base}.{segment}")
    }
}

/// True when `candidate` lies strictly below `base`.
///
/// The test is segment-aware: `a.bc` is not under `a.b`.
pub fn is_descendant(candidate: &str, base: &str) -> bool {
    if base.is_empty() {
        return !candidate.is_empty();
    }
    candidate.len() > base.len()
        && candidate.starts_with(base)
        && candidate.as_bytes()[base.len()] == b'.'
}

/// Outcome of walking a path through the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    /// The value found at the path, `None` when the path is absent
    pub value: Option<Value>,
    /// How many segments were left unresolved; 0 when the path exists
    pub missing_depth: usize,
}

impl Resolution {
    /// True when the last segment is present on its parent.
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// True when the path stopped resolving above its direct parent.
    pub fn is_deep_miss(&self) -> bool {
        self.missing_depth > 1
    }

    /// The resolved value, or `null` for absent paths.
    pub fn value_or_null(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }
}

/// Walks `path` through `root` without cloning.
///
/// Returns the value (if present) and the number of unresolved segments.
pub fn resolve_ref<'a>(root: &'a Value, path: &str) -> (Option<&'a Value>, usize) {
    let segments = split(path);
    let total = segments.len();
    let mut current = root;

    for (depth, segment) in segments.iter().enumerate() {
        let next = match current {
            Value::Object(map) => map.get(*segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return (None, total - depth),
        }
    }
    (Some(current), 0)
}

/// Walks `path` through `root`, reporting existence and miss depth.
pub fn resolve(root: &Value, path: &str) -> Resolution {
    let (value, missing_depth) = resolve_ref(root, path);
    Resolution {
        value: value.cloned(),
        missing_depth,
    }
}
