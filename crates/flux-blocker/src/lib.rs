//! Flux Content Blocker
//!
//! In-process ad and tracker blocking for the browser's request-interception
//! hook. The host engine calls [`ContentBlocker::classify`] synchronously
//! once per outgoing request and gets an allow/block decision back.
//!
//! Architecture:
//! 1. Two fixed pattern tables (ads, trackers) compiled once at startup
//! 2. Ad table scanned first, first match wins within a table
//! 3. Every block bumps an atomic counter the status bar polls
//! 4. Anything malformed or unexpected fails open to Allow

mod blocker;
mod pattern;
mod rules;

pub use blocker::{
    ContentBlocker, Decision, RequestContext, RequestFilter, ResourceType, StatsSnapshot,
};
pub use pattern::{Pattern, PatternError};
pub use rules::{AD_PATTERNS, BlockCategory, RuleSet, TRACKER_PATTERNS};
