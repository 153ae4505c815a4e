//! Ignore filter value object
//!
//! Glob patterns excluding paths from transfer, matched with gitignore
//! semantics: `*`, `**`, `{a,b}`, `[abc]`, case-sensitive. A pattern without a
//! slash matches the basename at any depth; a pattern with a slash is anchored
//! to the relative path.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Maximum number of patterns allowed
const MAX_PATTERNS: usize = 1000;

/// An ordered set of ignore patterns.
///
/// Uses the `ignore` crate for gitignore-compatible pattern matching.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    matcher: Gitignore,
    patterns: Vec<String>,
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::empty()
    }
}

impl IgnoreFilter {
    /// Create an empty filter (matches nothing).
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
            patterns: Vec::new(),
        }
    }

    /// Build a filter from individual patterns. Blank patterns are skipped.
    pub fn new<I, S>(patterns: I) -> Result<Self, IgnoreFilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new("");
        let mut kept = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }

            if kept.len() == MAX_PATTERNS {
                return Err(IgnoreFilterError::TooManyPatterns {
                    limit: MAX_PATTERNS,
                });
            }

            builder
                .add_line(None, pattern)
                .map_err(|e| IgnoreFilterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            kept.push(pattern.to_string());
        }

        if kept.is_empty() {
            return Ok(Self::empty());
        }

        let matcher = builder
            .build()
            .map_err(|e| IgnoreFilterError::BuildFailed(e.to_string()))?;

        Ok(Self {
            matcher,
            patterns: kept,
        })
    }

    /// Parse a comma-separated pattern list, e.g. `"*.map, .git, node_modules"`.
    ///
    /// Commas inside `{...}` belong to the alternation, not the list.
    pub fn from_list(list: &str) -> Result<Self, IgnoreFilterError> {
        Self::new(split_list(list))
    }

    /// Check whether a relative path is excluded.
    ///
    /// The path is matched as a relative path first (parents included, so a
    /// file under an ignored directory is ignored too), then by basename.
    pub fn matches(&self, rel_path: &Path, is_dir: bool) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let rel = normalize(rel_path);
        if rel.as_os_str().is_empty() {
            return false;
        }

        match self.matcher.matched_path_or_any_parents(&rel, is_dir) {
            Match::Ignore(_) => return true,
            Match::Whitelist(_) => return false,
            Match::None => {}
        }

        rel.file_name()
            .map(|name| self.matcher.matched(Path::new(name), is_dir).is_ignore())
            .unwrap_or(false)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn split_list(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

/// Keep only normal components so the matcher never sees a rooted path.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// Errors that can occur when building an ignore filter.
#[derive(Debug, Error)]
pub enum IgnoreFilterError {
    #[error("invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("too many ignore patterns (limit {limit})")]
    TooManyPatterns { limit: usize },

    #[error("failed to build ignore matcher: {0}")]
    BuildFailed(String),
}
