//! Orchestrator statistics and health

use crate::model::{ErrorType, FetchMethod, ProcessingResult};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Results kept for the rolling success rate
pub const ROLLING_WINDOW: usize = 100;

/// Below this many results health is reported as healthy
const MIN_RESULTS_FOR_HEALTH: usize = 5;

const HEALTHY_RATE: f64 = 0.8;
const DEGRADED_RATE: f64 = 0.5;

/// Per-origin breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginStats {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub rate_limited: u64,
}

/// Snapshot returned by `get_stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorStats {
    pub submitted: u64,
    pub completed: u64,
    pub successful: u64,
    pub failed: u64,
    pub in_flight: u64,
    pub queued: usize,
    pub attempts: u64,
    pub retries: u64,
    pub timeouts: u64,
    pub robots_blocked: u64,
    pub static_fetches: u64,
    pub dynamic_fetches: u64,
    pub escalations: u64,
    /// Success rate over the last [`ROLLING_WINDOW`] results, 0.0..=1.0
    pub success_rate: f64,
    pub average_response_time_ms: f64,
    pub uptime_secs: u64,
    pub origins: BTreeMap<String, OriginStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: HealthLevel,
    pub success_rate: f64,
    pub recent_results: usize,
    pub issues: Vec<String>,
}

/// Lock-light statistics shared by all workers
pub struct StatsRecorder {
    started: Instant,
    submitted: AtomicU64,
    completed: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    attempts: AtomicU64,
    retries: AtomicU64,
    timeouts: AtomicU64,
    robots_blocked: AtomicU64,
    static_fetches: AtomicU64,
    dynamic_fetches: AtomicU64,
    escalations: AtomicU64,
    total_response_ms: AtomicU64,
    origins: Mutex<HashMap<String, OriginStats>>,
    recent: Mutex<VecDeque<bool>>,
}

impl Default for StatsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            robots_blocked: AtomicU64::new(0),
            static_fetches: AtomicU64::new(0),
            dynamic_fetches: AtomicU64::new(0),
            escalations: AtomicU64::new(0),
            total_response_ms: AtomicU64::new(0),
            origins: Mutex::new(HashMap::new()),
            recent: Mutex::new(VecDeque::with_capacity(ROLLING_WINDOW)),
        }
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// One strategy invocation against `origin`
    pub fn record_attempt(&self, origin: &str, method: FetchMethod) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        match method {
            FetchMethod::Static => self.static_fetches.fetch_add(1, Ordering::Relaxed),
            FetchMethod::Dynamic => self.dynamic_fetches.fetch_add(1, Ordering::Relaxed),
        };
        lock(&self.origins)
            .entry(origin.to_string())
            .or_default()
            .requests += 1;
    }

    /// Classifies a failed attempt
    pub fn record_attempt_failure(&self, origin: &str, result: &ProcessingResult) {
        let Some(error) = result.primary_error() else {
            return;
        };
        if error.is_timeout() {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
        if error.kind == ErrorType::RateLimited {
            lock(&self.origins)
                .entry(origin.to_string())
                .or_default()
                .rate_limited += 1;
        }
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_robots_blocked(&self) {
        self.robots_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_escalation(&self) {
        self.escalations.fetch_add(1, Ordering::Relaxed);
    }

    /// Folds a terminal result into the counters and the rolling window
    pub fn record_result(&self, origin: &str, result: &ProcessingResult) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.total_response_ms
            .fetch_add(result.processing_time_ms, Ordering::Relaxed);
        if result.success {
            self.successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        {
            let mut origins = lock(&self.origins);
            let entry = origins.entry(origin.to_string()).or_default();
            if result.success {
                entry.successes += 1;
            } else {
                entry.failures += 1;
            }
        }

        let mut recent = lock(&self.recent);
        if recent.len() == ROLLING_WINDOW {
            recent.pop_front();
        }
        recent.push_back(result.success);
    }

    /// Success rate over the rolling window; 1.0 before any result
    pub fn rolling_success_rate(&self) -> (f64, usize) {
        let recent = lock(&self.recent);
        if recent.is_empty() {
            return (1.0, 0);
        }
        let successes = recent.iter().filter(|ok| **ok).count();
        (successes as f64 / recent.len() as f64, recent.len())
    }

    pub fn snapshot(&self, queued: usize) -> OrchestratorStats {
        let submitted = self.submitted.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let total_ms = self.total_response_ms.load(Ordering::Relaxed);
        let (success_rate, _) = self.rolling_success_rate();

        OrchestratorStats {
            submitted,
            completed,
            successful: self.successful.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            in_flight: submitted.saturating_sub(completed),
            queued,
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            robots_blocked: self.robots_blocked.load(Ordering::Relaxed),
            static_fetches: self.static_fetches.load(Ordering::Relaxed),
            dynamic_fetches: self.dynamic_fetches.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
            success_rate,
            average_response_time_ms: if completed == 0 {
                0.0
            } else {
                total_ms as f64 / completed as f64
            },
            uptime_secs: self.started.elapsed().as_secs(),
            origins: lock(&self.origins)
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Health from the rolling success rate
    ///
    /// | Rolling rate | Level |
    /// |--------------|-------|
    /// | ≥ 0.8, or fewer than 5 results | healthy |
    /// | ≥ 0.5 | degraded |
    /// | < 0.5 | unhealthy |
    pub fn health(&self, rate_limited_origins: &[String]) -> HealthStatus {
        let (success_rate, recent_results) = self.rolling_success_rate();
        let mut issues = Vec::new();

        let status = if recent_results < MIN_RESULTS_FOR_HEALTH || success_rate >= HEALTHY_RATE {
            HealthLevel::Healthy
        } else if success_rate >= DEGRADED_RATE {
            HealthLevel::Degraded
        } else {
            HealthLevel::Unhealthy
        };

        if status != HealthLevel::Healthy {
            issues.push(format!(
                "success rate {:.0}% over the last {} results",
                success_rate * 100.0,
                recent_results
            ));
        }

        let attempts = self.attempts.load(Ordering::Relaxed);
        let timeouts = self.timeouts.load(Ordering::Relaxed);
        if attempts > 0 && timeouts * 5 > attempts {
            issues.push(format!("{} of {} attempts timed out", timeouts, attempts));
        }

        if !rate_limited_origins.is_empty() {
            issues.push(format!(
                "rate limited by {}",
                rate_limited_origins.join(", ")
            ));
        }

        HealthStatus {
            status,
            success_rate,
            recent_results,
            issues,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
