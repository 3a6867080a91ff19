//! Glob-based path filtering.
//!
//! Patterns and paths are compared segment by segment after trimming the
//! leading `/`:
//!
//! - `*` as a whole segment matches exactly one segment
//! - `**` as a whole segment matches one or more segments
//! - `*` inside a segment (`todo*`) matches any run of characters within it
//! - anything else matches literally
//!
//! # Example
//!
//! ```rust
//! use heron_docs::PathFilter;
//!
//! let filter = PathFilter::new()
//!     .allow(["/api/**"])
//!     .deny(["/api/internal/**"]);
//!
//! assert!(filter.is_included("/api/todos"));
//! assert!(!filter.is_included("/api/internal/health"));
//! assert!(!filter.is_included("/api"));
//! ```

use serde::{Deserialize, Serialize};

/// Allow/deny glob lists applied to discovered path templates.
///
/// Without an allow-list every path is a candidate; with one, a path must
/// match at least one allow pattern. Deny patterns are subtracted in both
/// cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFilter {
    /// Allow patterns. `None` allows everything.
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
    /// Deny patterns.
    #[serde(default)]
    pub denied: Vec<String>,
}

/// Result of filtering a set of paths. Both lists keep input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Paths that passed the filter.
    pub included: Vec<String>,
    /// Paths that were filtered out.
    pub excluded: Vec<String>,
}

impl PathFilter {
    /// A filter that includes everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the allow-list.
    #[must_use]
    pub fn allow<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds deny patterns.
    #[must_use]
    pub fn deny<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Whether a single path passes the filter.
    #[must_use]
    pub fn is_included(&self, path: &str) -> bool {
        let allowed = self
            .allowed
            .as_ref()
            .map_or(true, |patterns| patterns.iter().any(|p| glob_match(p, path)));
        allowed && !self.denied.iter().any(|p| glob_match(p, path))
    }

    /// Splits paths into included and excluded.
    pub fn apply<I, S>(&self, paths: I) -> FilterOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut outcome = FilterOutcome::default();
        for path in paths {
            let path = path.as_ref();
            if self.is_included(path) {
                outcome.included.push(path.to_string());
            } else {
                outcome.excluded.push(path.to_string());
            }
        }
        outcome
    }

    /// Checks that every pattern is usable.
    ///
    /// Returns the first offending pattern: an empty pattern, or one where
    /// `**` is combined with other characters in a segment.
    pub fn validate(&self) -> Result<(), String> {
        let all = self.allowed.iter().flatten().chain(self.denied.iter());
        for pattern in all {
            let bad_segment = segments(pattern)
                .any(|segment| segment != "**" && segment.contains("**"));
            if pattern.trim().is_empty() || bad_segment {
                return Err(pattern.clone());
            }
        }
        Ok(())
    }
}

/// Matches a path against a single glob pattern.
///
/// ```rust
/// use heron_docs::glob_match;
///
/// assert!(glob_match("/api/foo/*/baz", "/api/foo/bar/baz"));
/// assert!(!glob_match("/api/foo/*/baz", "/api/foo/bar/qux/baz"));
/// assert!(glob_match("/api/foo/**", "/api/foo/bar/{baz}/qux"));
/// assert!(!glob_match("/api/foo/**", "/api/foo"));
/// ```
#[must_use]
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern: Vec<&str> = segments(pattern).collect();
    let path: Vec<&str> = segments(path).collect();
    match_segments(&pattern, &path)
}

fn segments(s: &str) -> std::str::Split<'_, char> {
    s.trim_start_matches('/').split('/')
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match (pattern.split_first(), path.split_first()) {
        (None, None) => true,
        (Some((&"**", rest)), Some((_, path_rest))) => {
            match_segments(rest, path_rest) || match_segments(pattern, path_rest)
        }
        (Some((head, rest)), Some((segment, path_rest))) => {
            match_segment(head, segment) && match_segments(rest, path_rest)
        }
        _ => false,
    }
}

fn match_segment(pattern: &str, segment: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == segment;
    }

    let pattern = pattern.as_bytes();
    let segment = segment.as_bytes();
    let (mut p, mut s) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while s < segment.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, s));
            p += 1;
        } else if p < pattern.len() && pattern[p] == segment[s] {
            p += 1;
            s += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            s = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}
