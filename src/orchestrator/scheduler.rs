//! Per-origin pacing
//!
//! This module handles:
//! - Spacing same-origin requests by the robots.txt crawl-delay or a default
//! - Clamping oversized crawl-delay values
//! - Pushing an origin back after a 429 response

use crate::state::OriginState;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Spaces out requests to the same origin across all workers
///
/// Slots are reserved under the lock and waited for outside it, so workers
/// hitting different origins never block each other.
pub struct Pacer {
    origins: Mutex<HashMap<String, OriginState>>,
    default_delay: Duration,
    max_delay: Duration,
}

impl Pacer {
    /// # Arguments
    ///
    /// * `default_delay` - Spacing when robots.txt declares no crawl-delay
    /// * `max_delay` - Upper bound for robots.txt crawl-delay values
    pub fn new(default_delay: Duration, max_delay: Duration) -> Self {
        Self {
            origins: Mutex::new(HashMap::new()),
            default_delay,
            max_delay,
        }
    }

    /// Spacing applied to an origin given its robots.txt crawl-delay
    pub fn spacing(&self, crawl_delay: Option<Duration>) -> Duration {
        match crawl_delay {
            Some(delay) => delay.min(self.max_delay),
            None => self.default_delay,
        }
    }

    /// Waits until `origin` may be contacted again
    ///
    /// # Returns
    ///
    /// How long the caller waited
    pub async fn wait_turn(&self, origin: &str, crawl_delay: Option<Duration>) -> Duration {
        let spacing = self.spacing(crawl_delay);
        let now = Instant::now();

        let slot = {
            let mut origins = self.lock();
            let state = origins.entry(origin.to_string()).or_default();
            if state.is_rate_limited(now) {
                tracing::debug!(origin, "Origin is rate limited, waiting for penalty to expire");
            }
            state.reserve(now, spacing)
        };

        let wait = slot.saturating_duration_since(now);
        if !wait.is_zero() {
            tracing::trace!(origin, wait_ms = wait.as_millis() as u64, "Pacing request");
            tokio::time::sleep_until(slot).await;
        }
        wait
    }

    /// Delays the next request to `origin` by at least `delay`
    pub fn penalize(&self, origin: &str, delay: Duration) {
        let mut origins = self.lock();
        origins
            .entry(origin.to_string())
            .or_default()
            .penalize(Instant::now(), delay);
        tracing::info!(origin, delay_ms = delay.as_millis() as u64, "Origin rate limited");
    }

    /// Requests started per origin so far
    pub fn request_counts(&self) -> HashMap<String, u32> {
        self.lock()
            .iter()
            .map(|(origin, state)| (origin.clone(), state.request_count))
            .collect()
    }

    /// Origins currently serving a 429 penalty
    pub fn rate_limited_origins(&self) -> Vec<String> {
        let now = Instant::now();
        let mut origins: Vec<String> = self
            .lock()
            .iter()
            .filter(|(_, state)| state.is_rate_limited(now))
            .map(|(origin, _)| origin.clone())
            .collect();
        origins.sort();
        origins
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, OriginState>> {
        self.origins
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
