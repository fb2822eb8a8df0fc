//! Property-based tests for path handling and state merging.

use std::sync::Arc;

use formwork_validator::path::{is_descendant, join, resolve, split};
use formwork_validator::prelude::*;
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Seg {
    Key(String),
    Index(usize),
}

impl Seg {
    fn text(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(index) => index.to_string(),
        }
    }

    fn bracketed(&self) -> String {
        match self {
            Self::Key(key) => format!("[\"{key}\"]"),
            Self::Index(index) => format!("[{index}]"),
        }
    }

    fn segment(&self) -> PathSegment {
        match self {
            Self::Key(key) => PathSegment::from(key.as_str()),
            Self::Index(index) => PathSegment::from(*index),
        }
    }
}

fn seg() -> impl Strategy<Value = Seg> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,6}".prop_map(Seg::Key),
        (0usize..50).prop_map(Seg::Index),
    ]
}

// ============================================================================
// CANONICALIZATION
// ============================================================================

proptest! {
    #[test]
    fn dot_bracket_and_segment_forms_agree(
        head in "[a-z]{1,6}",
        rest in prop::collection::vec(seg(), 0..5),
    ) {
        let dotted = std::iter::once(head.clone())
            .chain(rest.iter().map(Seg::text))
            .collect::<Vec<_>>()
            .join(".");
        let bracketed = format!(
            "{head}{}",
            rest.iter().map(Seg::bracketed).collect::<String>()
        );
        let segments: Vec<PathSegment> = std::iter::once(PathSegment::from(head.as_str()))
            .chain(rest.iter().map(Seg::segment))
            .collect();

        let canonical = normalize(dotted.as_str());
        prop_assert_eq!(&*canonical, dotted.as_str());
        prop_assert_eq!(&*normalize(bracketed.as_str()), &*canonical);
        prop_assert_eq!(&*normalize(segments), &*canonical);
    }

    #[test]
    fn normalization_is_cached_per_raw_key(
        raw in "[a-z]{1,4}(\\[[0-9]{1,2}\\])?(\\.[a-z]{1,4}){0,3}",
    ) {
        let first = normalize(raw.as_str());
        let second = normalize(raw.clone());
        prop_assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn normalization_is_idempotent(raw in "[a-z]{1,4}(\\[[0-9]{1,2}\\]|\\.[a-z]{1,4}){0,4}") {
        let once = normalize(raw.as_str());
        let twice = normalize(&*once);
        prop_assert_eq!(&*once, &*twice);
    }
}

// ============================================================================
// PATH RELATIONS
// ============================================================================

proptest! {
    #[test]
    fn joined_paths_are_descendants(
        base in "[a-z]{1,5}(\\.[a-z0-9]{1,5}){0,3}",
        tail in "[a-z0-9]{1,5}",
    ) {
        let child = join(&base, &tail);
        prop_assert!(is_descendant(&child, &base));
        prop_assert!(!is_descendant(&base, &child));
        prop_assert!(!is_descendant(&base, &base));
        prop_assert_eq!(split(&child).len(), split(&base).len() + 1);
    }

    #[test]
    fn sibling_with_shared_prefix_is_not_a_descendant(base in "[a-z]{1,5}", extra in "[a-z]{1,3}") {
        let sibling = format!("{base}{extra}");
        prop_assert!(!is_descendant(&sibling, &base));
    }

    #[test]
    fn missing_depth_counts_unresolved_segments(present in 0usize..4, missing in 1usize..4) {
        let mut model = json!("leaf");
        for depth in (0..present).rev() {
            let mut parent = serde_json::Map::new();
            parent.insert(format!("k{depth}"), model);
            model = serde_json::Value::Object(parent);
        }
        let path = (0..present + missing)
            .map(|depth| format!("k{depth}"))
            .collect::<Vec<_>>()
            .join(".");

        let resolution = resolve(&model, &path);
        prop_assert!(!resolution.exists());
        prop_assert_eq!(resolution.missing_depth, missing);
    }
}

// ============================================================================
// STATE MERGING
// ============================================================================

fn status() -> impl Strategy<Value = ValidateStatus> {
    prop_oneof![
        Just(ValidateStatus::None),
        Just(ValidateStatus::Validating),
        Just(ValidateStatus::Success),
        Just(ValidateStatus::Error),
    ]
}

proptest! {
    #[test]
    fn merged_status_is_the_most_severe(statuses in prop::collection::vec(status(), 1..6)) {
        let infos: Vec<ValidationInfo> = statuses
            .iter()
            .map(|status| ValidationInfo { validate_status: *status, ..ValidationInfo::default() })
            .collect();
        let merged = merge_validation_info(&infos);

        let rank = |status: ValidateStatus| match status {
            ValidateStatus::None => 0,
            ValidateStatus::Success => 1,
            ValidateStatus::Validating => 2,
            ValidateStatus::Error => 3,
        };
        let worst = statuses.iter().copied().max_by_key(|s| rank(*s)).unwrap_or_default();
        prop_assert_eq!(merged.validate_status, worst);
    }
}
