//! Robots.txt caching implementation
//!
//! Entries carry their own expiry: a fetched or missing robots.txt lives for
//! the configured TTL, while a fetch that failed on transport or a 5xx lives
//! only for [`RETRY_WINDOW_MINUTES`].

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};

/// Lifetime of a fail-open entry created after a transport error or 5xx
pub const RETRY_WINDOW_MINUTES: i64 = 5;

/// How the cached robots.txt was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotsSource {
    /// 2xx response; rules are enforced
    Fetched,
    /// 4xx response; no restrictions
    Missing,
    /// Network error or 5xx; no restrictions until the retry window ends
    Unreachable,
}

/// Cached robots.txt data for an origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub content: ParsedRobots,
    pub source: RobotsSource,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates an entry whose lifetime depends on how it was obtained
    ///
    /// # Arguments
    ///
    /// * `content` - The parsed robots.txt content
    /// * `source` - Outcome of the fetch
    /// * `ttl` - Lifetime of fetched and missing entries
    pub fn new(content: ParsedRobots, source: RobotsSource, ttl: Duration) -> Self {
        let fetched_at = Utc::now();
        let lifetime = match source {
            RobotsSource::Fetched | RobotsSource::Missing => ttl,
            RobotsSource::Unreachable => Duration::minutes(RETRY_WINDOW_MINUTES).min(ttl),
        };

        Self {
            content,
            source,
            fetched_at,
            expires_at: fetched_at + lifetime,
        }
    }

    /// Checks if the entry has outlived its expiry
    pub fn is_stale(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns the age of the cached robots.txt
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    /// Whether a robots.txt file was actually served
    pub fn exists(&self) -> bool {
        self.source == RobotsSource::Fetched
    }

    pub fn is_allowed(&self, url: &str, product_token: &str) -> bool {
        self.content.is_allowed(url, product_token)
    }

    /// Crawl delay in seconds, if specified
    pub fn crawl_delay(&self, product_token: &str) -> Option<f64> {
        self.content.crawl_delay(product_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cache_not_stale() {
        let cache = CachedRobots::new(
            ParsedRobots::allow_all(),
            RobotsSource::Missing,
            Duration::hours(24),
        );
        assert!(!cache.is_stale());
        assert!(!cache.exists());
    }

    #[test]
    fn test_cache_is_stale_after_ttl() {
        let mut cache = CachedRobots::new(
            ParsedRobots::from_content("User-agent: *\nDisallow: /x\n"),
            RobotsSource::Fetched,
            Duration::hours(24),
        );
        cache.fetched_at = Utc::now() - Duration::hours(25);
        cache.expires_at = cache.fetched_at + Duration::hours(24);

        assert!(cache.is_stale());
    }

    #[test]
    fn test_unreachable_uses_retry_window() {
        let cache = CachedRobots::new(
            ParsedRobots::allow_all(),
            RobotsSource::Unreachable,
            Duration::hours(24),
        );
        let lifetime = cache.expires_at - cache.fetched_at;
        assert_eq!(lifetime, Duration::minutes(RETRY_WINDOW_MINUTES));
    }

    #[test]
    fn test_fetched_uses_full_ttl() {
        let cache = CachedRobots::new(
            ParsedRobots::allow_all(),
            RobotsSource::Fetched,
            Duration::hours(6),
        );
        assert_eq!(cache.expires_at - cache.fetched_at, Duration::hours(6));
        assert!(cache.exists());
    }

    #[test]
    fn test_age() {
        let mut cache = CachedRobots::new(
            ParsedRobots::allow_all(),
            RobotsSource::Missing,
            Duration::hours(24),
        );
        cache.fetched_at = Utc::now() - Duration::hours(12);

        let age = cache.age();
        assert!(age.num_hours() >= 11 && age.num_hours() <= 13);
    }

    #[test]
    fn test_is_allowed_delegates_to_content() {
        let cache = CachedRobots::new(
            ParsedRobots::from_content("User-agent: *\nDisallow: /private\n"),
            RobotsSource::Fetched,
            Duration::hours(24),
        );

        assert!(!cache.is_allowed("https://example.com/private/x", "TestBot"));
        assert!(cache.is_allowed("https://example.com/public", "TestBot"));
    }
}
