//! Configuration module for Fairway Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use fairway_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fairway.toml")).unwrap();
//! println!("Workers: {}", config.scraper.max_concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, OutputConfig, ScraperConfig, SelectorEntry, TargetEntry,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
