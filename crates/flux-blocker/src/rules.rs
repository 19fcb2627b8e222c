//! Built-in Rule Tables
//!
//! Two fixed pattern groups, embedded at compile time for zero startup cost.
//! Order matters: each table is scanned top to bottom and the first match
//! wins, so tests that assert on specific URLs stay reproducible.

use crate::pattern::{Pattern, PatternError};
use serde::{Deserialize, Serialize};

/// Ad patterns, checked before the tracker table.
pub const AD_PATTERNS: &[&str] = &[
    "ads*.js",
    "banner",
    "advert",
    "/ads/",
    "doubleclick.net",
    "googlesyndication.com",
    "googleadservices.com",
    "advertising.com",
    "adserver",
    "adservice",
    "ad-",
    "pagead",
    "adsbygoogle",
];

/// Tracker patterns, only reached when the ad scan produced no block.
pub const TRACKER_PATTERNS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "facebook.com/tr/",
    "facebook.net/",
    "scorecardresearch.com",
    "tracking",
    "analytics",
    "tracker",
    "telemetry",
    "metrics",
];

/// Category a blocking rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockCategory {
    Ad,
    Tracker,
}

impl std::fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ad => write!(f, "ad"),
            Self::Tracker => write!(f, "tracker"),
        }
    }
}

/// An ordered, immutable group of compiled patterns for one category
#[derive(Debug)]
pub struct RuleSet {
    category: BlockCategory,
    patterns: Vec<Pattern>,
}

impl RuleSet {
    /// Compile a rule set from pattern sources, preserving their order.
    ///
    /// Any malformed pattern rejects the whole set at load time.
    pub fn compile(category: BlockCategory, sources: &[&str]) -> Result<Self, PatternError> {
        let patterns = sources
            .iter()
            .map(|s| Pattern::compile(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { category, patterns })
    }

    /// Category of every rule in this set.
    pub fn category(&self) -> BlockCategory {
        self.category
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if the set holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Scan in registration order, short-circuiting on the first hit.
    ///
    /// Takes an already-lowercased URL. Returns the matching pattern so the
    /// caller can log which rule fired.
    #[inline]
    pub fn first_match(&self, url_lower: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.matches_lower(url_lower))
    }
}
