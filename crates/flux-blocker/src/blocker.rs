//! Content Blocker
//!
//! Classifies every outgoing request BEFORE the engine dispatches it and
//! vetoes ads and trackers. This sits on the critical path of every
//! sub-resource load, so the hot path is atomic flag loads, one lowercase
//! pass over the URL, and a bounded scan of two small pattern tables.
//!
//! Flow:
//! 1. Request comes in with URL
//! 2. Disabled → Allow, no pattern work
//! 3. Ad table scan (first match wins) → Block(Ad)
//! 4. Tracker table scan, only if the ad scan produced no block → Block(Tracker)
//! 5. Otherwise Allow
//!
//! The blocker never fails a page load: malformed input and anything else
//! unexpected degrades to Allow.

use crate::pattern::PatternError;
use crate::rules::{AD_PATTERNS, BlockCategory, RuleSet, TRACKER_PATTERNS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, trace};
use url::Url;

/// Result of classifying one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Request is allowed to proceed
    Allow,
    /// Request is blocked, tagged with the category that matched
    Block(BlockCategory),
}

impl Decision {
    /// True for any block decision.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Block(_))
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Block(category) => write!(f, "block ({})", category),
        }
    }
}

/// Type of resource being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    /// Main document
    Document,
    /// CSS stylesheet
    Stylesheet,
    /// JavaScript
    Script,
    /// Image
    Image,
    /// Font
    Font,
    /// XHR/Fetch request
    XmlHttpRequest,
    /// Media (video/audio)
    Media,
    /// Other/Unknown
    Other,
}

impl ResourceType {
    /// Sniff the resource type from a URL path's extension.
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".js") { return Self::Script; }
        if path.ends_with(".css") { return Self::Stylesheet; }
        if path.ends_with(".woff") || path.ends_with(".woff2") || path.ends_with(".ttf") {
            return Self::Font;
        }
        if path.ends_with(".png") || path.ends_with(".jpg") ||
           path.ends_with(".jpeg") || path.ends_with(".gif") ||
           path.ends_with(".webp") || path.ends_with(".svg") {
            return Self::Image;
        }
        if path.ends_with(".mp4") || path.ends_with(".webm") ||
           path.ends_with(".mp3") || path.ends_with(".ogg") {
            return Self::Media;
        }
        if path.ends_with(".html") || path.ends_with(".htm") || path.ends_with("/") {
            return Self::Document;
        }

        Self::Other
    }
}

/// Optional metadata the host engine attaches to a request.
///
/// Opaque to the decision algorithm; carried for diagnostics only.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub resource_type: ResourceType,
}

/// The interception capability the host's network layer registers at startup.
///
/// One method, called synchronously once per outgoing request.
pub trait RequestFilter: Send + Sync {
    fn classify(&self, url: &str) -> Decision;
}

/// Blocking statistics
#[derive(Debug, Default)]
struct BlockerStats {
    total_requests: AtomicU64,
    blocked: AtomicU64,
    ads_blocked: AtomicU64,
    trackers_blocked: AtomicU64,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub blocked: u64,
    pub ads_blocked: u64,
    pub trackers_blocked: u64,
}

/// Ad and tracker blocker, one instance per browser profile.
///
/// Rule tables are compiled once at construction and never mutate; policy
/// flags and counters are atomics, so classify calls may come from any
/// thread without locking.
pub struct ContentBlocker {
    ads: RuleSet,
    trackers: RuleSet,
    enabled: AtomicBool,
    block_ads: AtomicBool,
    block_trackers: AtomicBool,
    stats: BlockerStats,
}

impl ContentBlocker {
    /// Build a blocker from the built-in rule tables.
    ///
    /// All built-in patterns are valid; the error path exists so a bad rule
    /// is rejected here rather than on the request path.
    pub fn new() -> Result<Self, PatternError> {
        let ads = RuleSet::compile(BlockCategory::Ad, AD_PATTERNS)?;
        let trackers = RuleSet::compile(BlockCategory::Tracker, TRACKER_PATTERNS)?;

        debug!(
            "Content blocker ready: {} ad patterns, {} tracker patterns",
            ads.len(),
            trackers.len()
        );

        Ok(Self {
            ads,
            trackers,
            enabled: AtomicBool::new(true),
            block_ads: AtomicBool::new(true),
            block_trackers: AtomicBool::new(true),
            stats: BlockerStats::default(),
        })
    }

    /// Enable or disable content blocking entirely.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Enable or disable ad blocking.
    pub fn set_block_ads(&self, block: bool) {
        self.block_ads.store(block, Ordering::Relaxed);
    }

    /// Enable or disable tracker blocking.
    pub fn set_block_trackers(&self, block: bool) {
        self.block_trackers.store(block, Ordering::Relaxed);
    }

    /// Classify a request URL.
    ///
    /// This is the hot path. It never errors and never panics: empty or
    /// unparseable input degrades to [`Decision::Allow`], because a missed
    /// block is acceptable and an aborted page load is not.
    #[inline]
    pub fn classify(&self, url: &str) -> Decision {
        self.classify_with_context(url, None)
    }

    /// Classify with optional host-supplied request metadata.
    ///
    /// The context does not influence the decision; it only enriches the
    /// trace log on block.
    pub fn classify_with_context(&self, url: &str, context: Option<&RequestContext>) -> Decision {
        if !self.enabled.load(Ordering::Relaxed) {
            return Decision::Allow;
        }

        self.stats.total_requests.fetch_add(1, Ordering::Relaxed);

        if url.is_empty() || Url::parse(url).is_err() {
            debug!("Malformed request URL, allowing: {:?}", url);
            return Decision::Allow;
        }

        let url_lower = url.to_lowercase();

        if self.block_ads.load(Ordering::Relaxed) {
            if let Some(pattern) = self.ads.first_match(&url_lower) {
                return self.record_block(url, pattern.source(), BlockCategory::Ad, context);
            }
        }

        // Only reached when the ad scan produced no block. A URL matching an
        // ad pattern still falls through here when ad-blocking is off.
        if self.block_trackers.load(Ordering::Relaxed) {
            if let Some(pattern) = self.trackers.first_match(&url_lower) {
                return self.record_block(url, pattern.source(), BlockCategory::Tracker, context);
            }
        }

        Decision::Allow
    }

    fn record_block(
        &self,
        url: &str,
        pattern: &str,
        category: BlockCategory,
        context: Option<&RequestContext>,
    ) -> Decision {
        self.stats.blocked.fetch_add(1, Ordering::Relaxed);
        match category {
            BlockCategory::Ad => self.stats.ads_blocked.fetch_add(1, Ordering::Relaxed),
            BlockCategory::Tracker => self.stats.trackers_blocked.fetch_add(1, Ordering::Relaxed),
        };

        trace!(
            "Blocked {} request: {} (rule '{}', type {:?})",
            category,
            url,
            pattern,
            context.map(|c| c.resource_type)
        );

        Decision::Block(category)
    }

    /// Number of requests blocked since construction or the last reset.
    pub fn blocked_count(&self) -> u64 {
        self.stats.blocked.load(Ordering::Relaxed)
    }

    /// Snapshot all counters.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.stats.total_requests.load(Ordering::Relaxed),
            blocked: self.stats.blocked.load(Ordering::Relaxed),
            ads_blocked: self.stats.ads_blocked.load(Ordering::Relaxed),
            trackers_blocked: self.stats.trackers_blocked.load(Ordering::Relaxed),
        }
    }

    /// Zero the blocked counters. The lifetime request total is kept.
    pub fn reset_count(&self) {
        self.stats.blocked.store(0, Ordering::Relaxed);
        self.stats.ads_blocked.store(0, Ordering::Relaxed);
        self.stats.trackers_blocked.store(0, Ordering::Relaxed);
    }
}

impl RequestFilter for ContentBlocker {
    #[inline]
    fn classify(&self, url: &str) -> Decision {
        ContentBlocker::classify(self, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn blocker() -> ContentBlocker {
        ContentBlocker::new().unwrap()
    }

    #[test]
    fn test_blocks_ad_url() {
        let b = blocker();

        let decision = b.classify("https://pagead2.googlesyndication.com/pagead/js/ads.js");

        assert_eq!(decision, Decision::Block(BlockCategory::Ad));
        assert_eq!(b.blocked_count(), 1);
    }

    #[test]
    fn test_blocks_tracker_url() {
        let b = blocker();

        // No ad pattern matches this URL, so the tracker table is reached
        let decision = b.classify("https://www.google-analytics.com/collect");

        assert_eq!(decision, Decision::Block(BlockCategory::Tracker));
        assert_eq!(b.blocked_count(), 1);
    }

    #[test]
    fn test_allows_normal_url() {
        let b = blocker();

        assert_eq!(b.classify("https://example.com/index.html"), Decision::Allow);
        assert_eq!(b.blocked_count(), 0);
    }

    #[test]
    fn test_disabled_always_allows() {
        let b = blocker();
        b.set_enabled(false);

        assert_eq!(b.classify("https://ad.doubleclick.net/pixel"), Decision::Allow);
        assert_eq!(b.classify("https://www.google-analytics.com/collect"), Decision::Allow);
        assert_eq!(b.blocked_count(), 0);
    }

    #[test]
    fn test_ad_category_wins_over_tracker() {
        let b = blocker();

        // Matches "ad-" (ad) and "tracking" (tracker); ad table is checked first
        let decision = b.classify("https://cdn.example.com/ad-tracking.js");

        assert_eq!(decision, Decision::Block(BlockCategory::Ad));
    }

    #[test]
    fn test_tracker_only_mode() {
        let b = blocker();
        b.set_block_ads(false);

        // Pure ad URL: ad scan is skipped, no tracker pattern matches
        assert_eq!(b.classify("https://ad.doubleclick.net/pixel"), Decision::Allow);

        // Tracker URL still blocked
        assert_eq!(
            b.classify("https://cdn.example.com/telemetry/beacon"),
            Decision::Block(BlockCategory::Tracker)
        );
    }

    #[test]
    fn test_ads_only_mode() {
        let b = blocker();
        b.set_block_trackers(false);

        assert_eq!(
            b.classify("https://ad.doubleclick.net/pixel"),
            Decision::Block(BlockCategory::Ad)
        );
        assert_eq!(b.classify("https://www.google-analytics.com/collect"), Decision::Allow);
    }

    #[test]
    fn test_empty_and_malformed_input_allow() {
        let b = blocker();

        assert_eq!(b.classify(""), Decision::Allow);
        assert_eq!(b.classify("not a url"), Decision::Allow);
        // Would match "doubleclick.net" if it parsed, but it has no scheme
        assert_eq!(b.classify("doubleclick.net/ad"), Decision::Allow);
        assert_eq!(b.blocked_count(), 0);
    }

    #[test]
    fn test_no_deduplication_by_url() {
        let b = blocker();
        let url = "https://ad.doubleclick.net/pixel";

        assert_eq!(b.classify(url), b.classify(url));
        assert_eq!(b.blocked_count(), 2);
    }

    #[test]
    fn test_reset_count() {
        let b = blocker();

        b.classify("https://ad.doubleclick.net/pixel");
        b.classify("https://www.google-analytics.com/collect");
        assert_eq!(b.blocked_count(), 2);

        b.reset_count();
        assert_eq!(b.blocked_count(), 0);

        b.classify("https://ad.doubleclick.net/pixel");
        assert_eq!(b.blocked_count(), 1);
    }

    #[test]
    fn test_stats_per_category() {
        let b = blocker();

        b.classify("https://ad.doubleclick.net/pixel");
        b.classify("https://www.google-analytics.com/collect");
        b.classify("https://example.com/index.html");

        let stats = b.stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.blocked, 2);
        assert_eq!(stats.ads_blocked, 1);
        assert_eq!(stats.trackers_blocked, 1);
    }

    #[test]
    fn test_reset_keeps_lifetime_total() {
        let b = blocker();

        b.classify("https://ad.doubleclick.net/pixel");
        b.reset_count();

        assert_eq!(b.stats().total_requests, 1);
        assert_eq!(b.stats().blocked, 0);
    }

    #[test]
    fn test_setters_take_effect_on_next_call() {
        let b = blocker();
        let url = "https://ad.doubleclick.net/pixel";

        assert!(b.classify(url).is_blocked());
        b.set_enabled(false);
        assert_eq!(b.classify(url), Decision::Allow);
        b.set_enabled(true);
        assert!(b.classify(url).is_blocked());
    }

    #[test]
    fn test_context_does_not_change_decision() {
        let b = blocker();
        let ctx = RequestContext {
            resource_type: ResourceType::Script,
        };

        assert_eq!(
            b.classify_with_context("https://ad.doubleclick.net/ad.js", Some(&ctx)),
            b.classify("https://ad.doubleclick.net/ad.js")
        );
    }

    #[test]
    fn test_usable_as_trait_object() {
        let filter: Arc<dyn RequestFilter> = Arc::new(blocker());

        assert!(filter.classify("https://ad.doubleclick.net/pixel").is_blocked());
        assert_eq!(filter.classify("https://example.com/"), Decision::Allow);
    }

    #[test]
    fn test_concurrent_blocks_lose_no_increments() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 500;

        let b = Arc::new(blocker());
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let b = Arc::clone(&b);
                std::thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        assert!(b.classify("https://ad.doubleclick.net/pixel").is_blocked());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(b.blocked_count(), (THREADS * PER_THREAD) as u64);
    }

    #[test]
    fn test_resource_type_sniffing() {
        assert_eq!(ResourceType::from_path("/pagead/js/ads.js"), ResourceType::Script);
        assert_eq!(ResourceType::from_path("/style.css"), ResourceType::Stylesheet);
        assert_eq!(ResourceType::from_path("/pixel.gif"), ResourceType::Image);
        assert_eq!(ResourceType::from_path("/"), ResourceType::Document);
        assert_eq!(ResourceType::from_path("/collect"), ResourceType::Other);
    }
}
