//! Glob predicates over the activation path.
//!
//! `*` and `?` stay inside one `/`-separated segment, `**` spans segments.
//! The activation path includes the query string, so `/app/*` matches
//! `/app/settings?tab=1` but not `/app/settings/profile`.

use globset::{GlobBuilder, GlobMatcher};
use log::warn;

/// Compiled, ordered pattern list.
#[derive(Debug, Clone, Default)]
pub struct PathPatterns {
    matchers: Vec<GlobMatcher>,
}

impl PathPatterns {
    /// Compiles every valid pattern; invalid ones are logged and dropped.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Self {
        let matchers = patterns
            .iter()
            .filter_map(|pattern| compile_one(pattern.as_ref()))
            .collect();
        Self { matchers }
    }

    /// True iff any pattern matches. An empty list never matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.matchers.iter().any(|matcher| matcher.is_match(path))
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

/// Returns true iff any pattern glob-matches `path`, short-circuiting on the
/// first hit. An empty list returns false; callers treat "no patterns" as
/// "no constraint" themselves.
pub fn matches_any<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    patterns
        .iter()
        .filter_map(|pattern| compile_one(pattern.as_ref()))
        .any(|matcher| matcher.is_match(path))
}

fn compile_one(pattern: &str) -> Option<GlobMatcher> {
    match GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
    {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(err) => {
            warn!(
                "event=pattern_compile module=matcher status=error pattern={} error={}",
                pattern, err
            );
            None
        }
    }
}
