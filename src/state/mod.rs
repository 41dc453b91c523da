//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `RequestState`: where a submission is in its lifecycle (queued, policy check, fetching, ...)
//! - `RequestLifecycle`: validated walk through `RequestState` for one submission
//! - `OriginState`: per-origin pacing slots and rate-limit penalties

mod origin_state;
mod request_state;

// Re-export main types
pub use origin_state::OriginState;
pub use request_state::{RequestLifecycle, RequestState};
