use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Default number of path segments a whitelist entry is truncated to.
/// Deeper paths collapse into their ancestor prefix, keeping the
/// predicate compact while staying a superset of the real content.
pub const DEFAULT_MAX_PREFIX_DEPTH: usize = 2;

/// Normalizes a repository path: leading slash, `/` separators, no empty,
/// `.` or `..` segments. Returns `None` for paths with no real segments.
pub fn normalize_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    if segments.is_empty() {
        return None;
    }

    Some(format!("/{}", segments.join("/")))
}

/// Truncates a normalized path to at most `depth` segments.
fn truncate_to_depth(normalized: &str, depth: usize) -> String {
    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    let keep = segments.len().min(depth.max(1));
    format!("/{}", segments[..keep].join("/"))
}

/// A compact set of path prefixes known to exist under one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSet {
    entries: BTreeSet<String>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw paths, normalizing and truncating each entry
    /// to `max_depth` segments. Unusable paths are dropped.
    pub fn from_paths<I, S>(paths: I, max_depth: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for path in paths {
            set.insert(path.as_ref(), max_depth);
        }
        set
    }

    pub fn insert(&mut self, path: &str, max_depth: usize) -> bool {
        match normalize_path(path) {
            Some(normalized) => self.entries.insert(truncate_to_depth(&normalized, max_depth)),
            None => false,
        }
    }

    /// True when `path` equals an entry or lies beneath one.
    pub fn matches(&self, path: &str) -> bool {
        let Some(normalized) = normalize_path(path) else {
            return false;
        };

        self.entries.iter().any(|entry| {
            normalized == *entry
                || normalized
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn union(&self, other: &PathSet) -> PathSet {
        PathSet {
            entries: self.entries.union(&other.entries).cloned().collect(),
        }
    }

    pub fn merge(&mut self, other: &PathSet) {
        self.entries.extend(other.entries.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Lifecycle status of a repository's predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PredicateStatus {
    /// Never computed; callers have no information.
    #[default]
    Unknown,
    /// Valid and usable for existence pre-checks.
    Available,
    /// Explicitly known absent (remote does not support listing, or the
    /// repository is offline). A stable negative, not an error.
    Unavailable,
}

impl PredicateStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, PredicateStatus::Available)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PredicateStatus::Unknown)
    }
}

/// Per-repository record of which resource paths are known to exist.
///
/// Owned exclusively by the predicate store. Losing it never loses data,
/// only cache efficiency: a background refresh rebuilds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPredicate {
    status: PredicateStatus,
    entries: PathSet,
    computed_at: i64,
}

impl PathPredicate {
    pub fn unknown() -> Self {
        Self {
            status: PredicateStatus::Unknown,
            entries: PathSet::new(),
            computed_at: 0,
        }
    }

    pub fn available(entries: PathSet) -> Self {
        Self {
            status: PredicateStatus::Available,
            entries,
            computed_at: current_timestamp(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: PredicateStatus::Unavailable,
            entries: PathSet::new(),
            computed_at: current_timestamp(),
        }
    }

    pub fn status(&self) -> PredicateStatus {
        self.status
    }

    pub fn entries(&self) -> &PathSet {
        &self.entries
    }

    pub fn computed_at(&self) -> i64 {
        self.computed_at
    }

    /// Existence pre-check for one path.
    ///
    /// Only an `Available` predicate carries information: a covered path
    /// is known-present, an uncovered one known-absent. `Unknown` and
    /// `Unavailable` predicates say nothing about any particular path, so
    /// callers fall back to the full remote check.
    pub fn verdict(&self, path: &str) -> PathVerdict {
        match self.status {
            PredicateStatus::Available => {
                if self.entries.matches(path) {
                    PathVerdict::Available
                } else {
                    PathVerdict::Unavailable
                }
            }
            PredicateStatus::Unknown | PredicateStatus::Unavailable => PathVerdict::Unknown,
        }
    }
}

/// Outcome of an existence pre-check against a repository's predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathVerdict {
    /// The path is covered by the whitelist; it is worth serving/fetching.
    Available,
    /// The whitelist is valid and does not cover the path; the remote
    /// round-trip can be skipped.
    Unavailable,
    /// No information; callers must do the full check.
    Unknown,
}

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("org/example"), Some("/org/example".into()));
        assert_eq!(normalize_path("/org//example/"), Some("/org/example".into()));
        assert_eq!(normalize_path("./org/../example"), Some("/org/example".into()));
        assert_eq!(normalize_path("/"), None);
        assert_eq!(normalize_path(""), None);
    }

    #[test]
    fn test_depth_truncation() {
        let set = PathSet::from_paths(["/org/example/widget/1.0/widget-1.0.jar"], 2);

        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["/org/example"]);
    }

    #[test]
    fn test_matches_is_prefix_containment() {
        let set = PathSet::from_paths(["/org/example", "/com/acme"], 2);

        assert!(set.matches("/org/example"));
        assert!(set.matches("/org/example/widget/1.0"));
        assert!(set.matches("com/acme/tool"));
        assert!(!set.matches("/org/exam"));
        assert!(!set.matches("/net/other"));
    }

    #[test]
    fn test_union_is_order_independent() {
        let a = PathSet::from_paths(["/a/1", "/b/1"], 2);
        let b = PathSet::from_paths(["/b/1", "/c/1"], 2);

        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&b).len(), 3);
    }

    #[test]
    fn test_verdicts() {
        let available = PathPredicate::available(PathSet::from_paths(["/org/example"], 2));
        assert_eq!(available.verdict("/org/example/x"), PathVerdict::Available);
        assert_eq!(available.verdict("/net/other"), PathVerdict::Unavailable);

        assert_eq!(PathPredicate::unknown().verdict("/org/example"), PathVerdict::Unknown);
        assert_eq!(
            PathPredicate::unavailable().verdict("/org/example"),
            PathVerdict::Unknown
        );
    }

    #[test]
    fn test_unknown_predicate_is_empty() {
        let predicate = PathPredicate::unknown();

        assert!(predicate.status().is_unknown());
        assert!(predicate.entries().is_empty());
        assert_eq!(predicate.computed_at(), 0);
    }
}
