use std::time::Duration;
use tokio::time::Instant;

/// Tracks the pacing state of one origin
///
/// Requests reserve start slots ahead of time, so concurrent workers that hit
/// the same origin are spaced out even though they wait in parallel.
#[derive(Debug, Clone, Default)]
pub struct OriginState {
    /// Number of requests started against this origin
    pub request_count: u32,

    /// Start time of the most recently reserved slot
    pub last_request_time: Option<Instant>,

    /// Earliest instant the next request may start
    pub next_slot: Option<Instant>,

    /// Set while a 429 penalty is pushing `next_slot` back
    pub rate_limited_until: Option<Instant>,
}

impl OriginState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next start slot and returns it
    ///
    /// # Arguments
    ///
    /// * `now` - The current time instant
    /// * `spacing` - Minimum gap to the following request
    pub fn reserve(&mut self, now: Instant, spacing: Duration) -> Instant {
        let start = match self.next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };

        self.next_slot = Some(start + spacing);
        self.last_request_time = Some(start);
        self.request_count += 1;
        start
    }

    /// Pushes the next slot back after a rate-limit response
    pub fn penalize(&mut self, now: Instant, delay: Duration) {
        let until = now + delay;
        self.rate_limited_until = Some(until);
        self.next_slot = Some(match self.next_slot {
            Some(slot) if slot > until => slot,
            _ => until,
        });
    }

    /// Whether a 429 penalty is still in force
    pub fn is_rate_limited(&self, now: Instant) -> bool {
        self.rate_limited_until.is_some_and(|until| until > now)
    }

    /// Returns the time until the next request can be made, or None if it can start now
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        self.next_slot
            .filter(|slot| *slot > now)
            .map(|slot| slot - now)
    }
}
