// Pattern Matching Utilities
// Regular-expression exclusions for the synchronization walk

use regex::Regex;
use std::path::Path;

use crate::core::error::ExclusionError;

/// Returns true if a line from an exclusion source is a comment
pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with(';') || trimmed.starts_with('#')
}

/// Ordered set of exclusion patterns
///
/// Each pattern is a regular expression searched (not anchored) in the
/// string form of a candidate path. Identical pattern strings are stored once.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<(String, Regex)>,
}

impl ExclusionSet {
    /// Create an empty exclusion set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern
    ///
    /// Returns `Ok(false)` when the exact same pattern is already present.
    pub fn add(&mut self, pattern: &str) -> Result<bool, ExclusionError> {
        if self.contains(pattern) {
            return Ok(false);
        }

        let regex = Regex::new(pattern).map_err(|source| ExclusionError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.patterns.push((pattern.to_string(), regex));
        Ok(true)
    }

    /// Register several patterns, stopping at the first invalid one
    ///
    /// Returns the number of patterns actually added.
    pub fn add_from_list<I, S>(&mut self, patterns: I) -> Result<usize, ExclusionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for pattern in patterns {
            if self.add(pattern.as_ref())? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Register patterns from externally loaded lines
    ///
    /// Blank lines and comments (`;` or `#`) are skipped, the rest is trimmed.
    pub fn add_from_source<I, S>(&mut self, lines: I) -> Result<usize, ExclusionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty() && !is_comment(line))
            .collect();
        self.add_from_list(patterns)
    }

    /// Remove a pattern, returning whether it was present
    pub fn remove(&mut self, pattern: &str) -> bool {
        let before = self.patterns.len();
        self.patterns.retain(|(p, _)| p != pattern);
        self.patterns.len() != before
    }

    /// Remove several patterns, returning how many were present
    pub fn remove_all<I, S>(&mut self, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .filter(|p| self.remove(p.as_ref()))
            .count()
    }

    /// Remove every pattern
    pub fn clear(&mut self) {
        self.patterns.clear();
    }

    /// Check if a path should be excluded
    pub fn matches(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let path_str = path.to_string_lossy();
        self.patterns.iter().any(|(_, regex)| regex.is_match(&path_str))
    }

    /// Whether the exact pattern string is registered
    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.iter().any(|(p, _)| p == pattern)
    }

    /// Registered pattern strings, in insertion order
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(|(p, _)| p.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Render the set as one pattern per line, for persisting
    pub fn to_lines(&self) -> Vec<String> {
        self.patterns.iter().map(|(p, _)| p.clone()).collect()
    }
}
