//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt per origin and answers
//! whether a URL may be scraped. Fetch failures never block scraping: a
//! robots.txt that cannot be retrieved places no restrictions on the origin.
//!
//! # Components
//!
//! - `PolicyGate`: single-flight cache and the allow/deny entry point
//! - `CachedRobots`: one origin's robots.txt with its expiry
//! - `ParsedRobots`: rule matching, crawl-delay and sitemap extraction

mod cache;
mod gate;
mod parser;

pub use cache::{CachedRobots, RobotsSource, RETRY_WINDOW_MINUTES};
pub use gate::{PolicyDecision, PolicyGate, RobotsInfo, RobotsPolicy};
pub use parser::{ParsedRobots, RobotsGroup};
