//! Request orchestrator - bounded, polite execution of scrape requests
//!
//! This module ties the pieces together:
//! - A priority queue with backpressure feeding a fixed worker pool
//! - robots.txt checks before every fetch
//! - Per-origin pacing
//! - Strategy selection between static and rendered fetching
//! - Per-attempt timeouts and bounded retry with exponential backoff
//! - Statistics and health reporting

use crate::config::{Config, ScraperConfig};
use crate::extractor::{DynamicExtractor, ScrapeStrategy, StaticExtractor};
use crate::model::{
    ErrorType, FetchMethod, ProcessingResult, ScrapeOptions, ScrapeTarget, ScrapingError,
    SourceType,
};
use crate::orchestrator::queue::RequestQueue;
use crate::orchestrator::retry::RetryPolicy;
use crate::orchestrator::scheduler::Pacer;
use crate::orchestrator::stats::{HealthStatus, OrchestratorStats, StatsRecorder};
use crate::renderer::{NoopRenderer, Renderer};
use crate::robots::PolicyGate;
use crate::state::{RequestLifecycle, RequestState};
use crate::url::extract_origin;
use crate::FairwayError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;

/// Slack past the attempt timeout before the orchestrator abandons a strategy
const ATTEMPT_GRACE: Duration = Duration::from_secs(1);

/// A submission waiting for a worker
struct Job {
    target: ScrapeTarget,
    options: ScrapeOptions,
    reply: oneshot::Sender<ProcessingResult>,
}

/// State shared by the handle and every worker
struct Shared {
    config: ScraperConfig,
    gate: Arc<PolicyGate>,
    static_strategy: Arc<dyn ScrapeStrategy>,
    dynamic_strategy: Arc<dyn ScrapeStrategy>,
    pacer: Pacer,
    retry: RetryPolicy,
    stats: StatsRecorder,
    queue: RequestQueue<Job>,
}

/// Runs scrape requests through a fixed pool of workers
///
/// Construct inside a Tokio runtime; workers are spawned immediately.
/// Call [`RequestOrchestrator::cleanup`] when done.
pub struct RequestOrchestrator {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl RequestOrchestrator {
    /// Creates an orchestrator with static fetching only
    ///
    /// Dynamic requests fall back to static fetching with a warning.
    pub fn new(config: &Config) -> Result<Self, FairwayError> {
        Self::with_renderer(config, Arc::new(NoopRenderer))
    }

    /// Creates an orchestrator whose dynamic strategy renders with `renderer`
    pub fn with_renderer(
        config: &Config,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, FairwayError> {
        let gate = Arc::new(PolicyGate::from_config(config)?);
        let static_strategy = Arc::new(StaticExtractor::from_config(config)?);
        let dynamic_strategy = Arc::new(DynamicExtractor::new(
            renderer,
            config.scraper.request_timeout(),
            config.browser.screenshots,
        ));

        Ok(Self::with_components(
            config.scraper.clone(),
            gate,
            static_strategy,
            dynamic_strategy,
        ))
    }

    /// Assembles an orchestrator from explicit parts
    pub fn with_components(
        config: ScraperConfig,
        gate: Arc<PolicyGate>,
        static_strategy: Arc<dyn ScrapeStrategy>,
        dynamic_strategy: Arc<dyn ScrapeStrategy>,
    ) -> Self {
        let worker_count = config.max_concurrent_requests.max(1);
        let shared = Arc::new(Shared {
            pacer: Pacer::new(config.default_crawl_delay(), config.max_crawl_delay()),
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.backoff_base_ms),
            ),
            stats: StatsRecorder::new(),
            queue: RequestQueue::new(config.queue_limit),
            config,
            gate,
            static_strategy,
            dynamic_strategy,
        });

        let workers = (0..worker_count)
            .map(|id| {
                let shared = shared.clone();
                tokio::spawn(async move { shared.run_worker(id).await })
            })
            .collect();

        tracing::info!(workers = worker_count, "Request orchestrator started");

        Self {
            shared,
            workers: Mutex::new(workers),
            closed: AtomicBool::new(false),
        }
    }

    /// Submits one target and waits for its result
    ///
    /// Waits for a queue slot when the queue is full. Scrape failures are
    /// reported inside the result.
    ///
    /// # Returns
    ///
    /// * `Ok(ProcessingResult)` - The terminal result for this submission
    /// * `Err(FairwayError::ShutDown)` - `cleanup` has been called
    /// * `Err(FairwayError::WorkerLost)` - The worker died without replying
    pub async fn add_request(
        &self,
        target: ScrapeTarget,
        options: ScrapeOptions,
    ) -> Result<ProcessingResult, FairwayError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FairwayError::ShutDown);
        }

        let target_id = target.id.clone();
        let rank = target.priority.rank();
        let (reply, receiver) = oneshot::channel();

        let job = Job {
            target,
            options,
            reply,
        };
        if self.shared.queue.push(rank, job).await.is_err() {
            return Err(FairwayError::ShutDown);
        }
        self.shared.stats.record_submitted();

        receiver
            .await
            .map_err(|_| FairwayError::WorkerLost { target_id })
    }

    /// Submits many targets at once; results are in input order
    pub async fn add_batch(
        &self,
        targets: Vec<ScrapeTarget>,
        options: ScrapeOptions,
    ) -> Vec<Result<ProcessingResult, FairwayError>> {
        let submissions = targets
            .into_iter()
            .map(|target| self.add_request(target, options.clone()));
        futures::future::join_all(submissions).await
    }

    pub fn get_stats(&self) -> OrchestratorStats {
        self.shared.stats.snapshot(self.shared.queue.len())
    }

    pub fn get_health_status(&self) -> HealthStatus {
        let rate_limited = self.shared.pacer.rate_limited_origins();
        let mut health = self.shared.stats.health(&rate_limited);
        if self.closed.load(Ordering::SeqCst) {
            health.issues.push("orchestrator is shut down".to_string());
        }
        health
    }

    pub fn policy_gate(&self) -> &Arc<PolicyGate> {
        &self.shared.gate
    }

    /// Stops accepting requests, finishes queued work and releases the renderer
    ///
    /// Safe to call more than once; later calls return immediately.
    pub async fn cleanup(&self) -> Result<(), FairwayError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::info!("Shutting down request orchestrator");
        self.shared.queue.close();

        let workers: Vec<JoinHandle<()>> = {
            let mut guard = self
                .workers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.drain(..).collect()
        };
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Worker task failed");
            }
        }

        let static_shutdown = self.shared.static_strategy.shutdown().await;
        let dynamic_shutdown = self.shared.dynamic_strategy.shutdown().await;
        static_shutdown?;
        dynamic_shutdown?;
        Ok(())
    }
}

impl Drop for RequestOrchestrator {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            self.shared.queue.close();
        }
    }
}

impl Shared {
    async fn run_worker(&self, id: usize) {
        tracing::debug!(worker = id, "Worker started");
        while let Some(job) = self.queue.pop().await {
            let result = self.process(&job.target, &job.options).await;
            if job.reply.send(result).is_err() {
                tracing::debug!(target_id = %job.target.id, "Submitter went away before the result");
            }
        }
        tracing::debug!(worker = id, "Worker stopped");
    }

    /// Drives one submission to its terminal result
    async fn process(&self, target: &ScrapeTarget, options: &ScrapeOptions) -> ProcessingResult {
        let started = Instant::now();
        let mut lifecycle = RequestLifecycle::new(&target.id);
        let origin = Url::parse(&target.url)
            .ok()
            .and_then(|u| extract_origin(&u))
            .unwrap_or_else(|| target.url.clone());

        let mut notes = Vec::new();
        let method = self.select_strategy(target, options, &mut notes);
        let mut attempt = 0;

        let mut result = loop {
            attempt += 1;
            advance(&mut lifecycle, RequestState::PolicyCheck);

            let decision = self.gate.can_scrape(&target.url).await;
            if !decision.allowed {
                self.stats.record_robots_blocked();
                advance(&mut lifecycle, RequestState::Failed { retryable: false });
                let reason = decision
                    .reason
                    .unwrap_or_else(|| "disallowed by robots.txt".to_string());
                tracing::info!(target_id = %target.id, url = %target.url, "Skipping: {}", reason);
                break ProcessingResult::failure(
                    &target.url,
                    ScrapingError::robots_disallowed(&target.url, reason),
                    method,
                    Vec::new(),
                    elapsed_ms(started),
                );
            }

            let result = self
                .attempt(target, options, method, &origin, attempt, &mut lifecycle)
                .await;

            if result.success {
                let result = self
                    .maybe_escalate(target, options, &origin, attempt, &mut lifecycle, result)
                    .await;
                advance(&mut lifecycle, RequestState::Succeeded);
                break result;
            }

            let retryable = result.is_retryable();
            advance(&mut lifecycle, RequestState::Failed { retryable });

            if !self.retry.should_retry(attempt, &result) {
                if retryable {
                    advance(&mut lifecycle, RequestState::Failed { retryable: false });
                }
                break result;
            }

            let delay = self.retry.delay(attempt);
            if result
                .primary_error()
                .is_some_and(|e| e.kind == ErrorType::RateLimited)
            {
                self.pacer.penalize(&origin, delay);
            }
            self.stats.record_retry();
            tracing::info!(
                target_id = %target.id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                code = result.primary_error().map(|e| e.code.as_str()).unwrap_or_default(),
                "Retrying after transient failure"
            );
            tokio::time::sleep(delay).await;
            advance(&mut lifecycle, RequestState::Queued);
        };

        notes.append(&mut result.warnings);
        result.warnings = notes;
        result.attempts = attempt;
        result.processing_time_ms = elapsed_ms(started);

        self.stats.record_result(&origin, &result);
        tracing::debug!(
            target_id = %target.id,
            history = ?lifecycle.history(),
            "Request finished"
        );
        result
    }

    /// Chooses the strategy for the first attempt
    ///
    /// Rendering is requested by `options.javascript` or a directory source.
    /// Without a working renderer the static strategy serves the request.
    fn select_strategy(
        &self,
        target: &ScrapeTarget,
        options: &ScrapeOptions,
        notes: &mut Vec<String>,
    ) -> FetchMethod {
        let wants_rendering = options.javascript || target.source_type == SourceType::Directory;
        if !wants_rendering {
            return FetchMethod::Static;
        }

        if self.dynamic_strategy.is_available() {
            FetchMethod::Dynamic
        } else {
            tracing::warn!(target_id = %target.id, "Renderer unavailable, falling back to static fetch");
            notes.push("renderer unavailable; fetched without JavaScript".to_string());
            FetchMethod::Static
        }
    }

    fn strategy(&self, method: FetchMethod) -> &dyn ScrapeStrategy {
        match method {
            FetchMethod::Static => self.static_strategy.as_ref(),
            FetchMethod::Dynamic => self.dynamic_strategy.as_ref(),
        }
    }

    /// One paced, time-limited strategy invocation
    async fn attempt(
        &self,
        target: &ScrapeTarget,
        options: &ScrapeOptions,
        method: FetchMethod,
        origin: &str,
        attempt: u32,
        lifecycle: &mut RequestLifecycle,
    ) -> ProcessingResult {
        let crawl_delay = self.gate.crawl_delay(origin).await;
        self.pacer.wait_turn(origin, crawl_delay).await;

        advance(lifecycle, RequestState::Fetching(method));
        self.stats.record_attempt(origin, method);

        let timeout = options.timeout().unwrap_or(self.config.request_timeout());
        let started = Instant::now();
        tracing::info!(target_id = %target.id, url = %target.url, %method, attempt, "Fetching");

        // Strategies enforce `timeout` themselves and clean up before returning
        let result = match tokio::time::timeout(
            timeout + ATTEMPT_GRACE,
            self.strategy(method).scrape_basic_info(target, options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => ProcessingResult::failure(
                &target.url,
                ScrapingError::timeout(&target.url, timeout),
                method,
                Vec::new(),
                elapsed_ms(started),
            ),
        };

        if result.success {
            advance(lifecycle, RequestState::Extracting);
            tracing::info!(
                target_id = %target.id,
                %method,
                attempt,
                confidence = result.confidence,
                elapsed_ms = elapsed_ms(started),
                "Fetched and extracted"
            );
        } else {
            self.stats.record_attempt_failure(origin, &result);
            if let Some(error) = result.primary_error() {
                tracing::warn!(
                    target_id = %target.id,
                    %method,
                    attempt,
                    code = %error.code,
                    retryable = error.retryable,
                    elapsed_ms = elapsed_ms(started),
                    "Attempt failed: {}",
                    error.message
                );
            }
        }

        result
    }

    /// Re-renders a low-confidence static result when a renderer is available
    ///
    /// The rendered result replaces the static one only if it succeeds with
    /// at least the same confidence.
    async fn maybe_escalate(
        &self,
        target: &ScrapeTarget,
        options: &ScrapeOptions,
        origin: &str,
        attempt: u32,
        lifecycle: &mut RequestLifecycle,
        result: ProcessingResult,
    ) -> ProcessingResult {
        if result.method() != FetchMethod::Static
            || result.confidence >= self.config.dynamic_confidence_threshold
            || !self.dynamic_strategy.is_available()
        {
            return result;
        }

        tracing::info!(
            target_id = %target.id,
            confidence = result.confidence,
            threshold = self.config.dynamic_confidence_threshold,
            "Low confidence, escalating to rendered fetch"
        );
        self.stats.record_escalation();

        let rendered = self
            .attempt(target, options, FetchMethod::Dynamic, origin, attempt, lifecycle)
            .await;
        if lifecycle.state() != RequestState::Extracting {
            advance(lifecycle, RequestState::Extracting);
        }

        if rendered.success && rendered.confidence >= result.confidence {
            rendered
        } else {
            let mut result = result;
            let reason = rendered
                .primary_error()
                .map(|e| e.code.clone())
                .unwrap_or_else(|| format!("confidence {}", rendered.confidence));
            result
                .warnings
                .push(format!("rendered fetch did not improve extraction ({})", reason));
            result
        }
    }
}

/// Applies a transition; an illegal one is a bug and only logged
fn advance(lifecycle: &mut RequestLifecycle, next: RequestState) {
    if let Err(e) = lifecycle.transition(next) {
        tracing::error!(error = %e, "Request lifecycle out of order");
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
