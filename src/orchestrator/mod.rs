//! Request orchestration
//!
//! This module contains the request pipeline:
//! - `coordinator`: the [`RequestOrchestrator`] and its worker pool
//! - `queue`: bounded priority queue
//! - `scheduler`: per-origin pacing
//! - `retry`: backoff policy
//! - `stats`: counters, rolling success rate and health

mod coordinator;
mod queue;
mod retry;
mod scheduler;
mod stats;

pub use coordinator::RequestOrchestrator;
pub use queue::RequestQueue;
pub use retry::RetryPolicy;
pub use scheduler::Pacer;
pub use stats::{
    HealthLevel, HealthStatus, OrchestratorStats, OriginStats, StatsRecorder, ROLLING_WINDOW,
};
