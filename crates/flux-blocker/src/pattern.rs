//! URL Pattern Matcher
//!
//! Patterns are simple substrings with optional `*` wildcards, compiled once
//! at startup. `ads*.js` means "contains `ads`, then `.js` somewhere after";
//! a pattern without `*` is a plain contains-check. Matching is
//! case-insensitive and allocation-free: the caller passes an
//! already-lowercased URL and compiled segments are stored lowercased.

use thiserror::Error;

/// Errors during pattern compilation
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Empty pattern")]
    Empty,

    #[error("Pattern has no literal text: {0}")]
    NoLiteral(String),
}

/// A single compiled URL pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Original pattern text
    source: String,
    /// Lowercased literal segments, in match order
    segments: Vec<String>,
}

impl Pattern {
    /// Compile a pattern from its source text.
    ///
    /// Fails fast on malformed input so a bad rule is rejected at load time
    /// rather than surfacing on the request path.
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        if source.is_empty() {
            return Err(PatternError::Empty);
        }

        let segments: Vec<String> = source
            .split('*')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect();

        if segments.is_empty() {
            return Err(PatternError::NoLiteral(source.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Original pattern text, for diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check the pattern against a URL that has already been lowercased.
    ///
    /// Each segment must occur after the end of the previous segment's match,
    /// so `ads*.js` matches `/pagead/js/ads.js` but not `/file.js?x=ads`.
    #[inline]
    pub fn matches_lower(&self, url_lower: &str) -> bool {
        let mut rest = url_lower;
        for segment in &self.segments {
            match rest.find(segment.as_str()) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
        true
    }
}
