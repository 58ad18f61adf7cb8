//! Request path matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Only the path component is tested; query strings never take part
//! - Patterns are compiled once, when the interceptor is built

use regex::Regex;

/// A compiled regex tested against request paths.
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    /// Compile a path pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Returns true if the path matches.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Source text of the pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
