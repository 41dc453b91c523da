//! Fairway Scout: a polite golf-course fact harvester
//!
//! This crate fetches golf course pages from third-party websites, respecting
//! robots.txt and per-origin pacing, and extracts structured course facts,
//! contact details and imagery with a confidence score attached.

pub mod config;
pub mod extractor;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod renderer;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Fairway Scout operations
///
/// Ordinary scrape failures are never reported through this type; they are
/// carried as [`model::ScrapingError`] entries inside a
/// [`model::ProcessingResult`]. This type covers setup and programming faults.
#[derive(Debug, Error)]
pub enum FairwayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Renderer error: {0}")]
    Renderer(#[from] anyhow::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RequestState,
        to: state::RequestState,
    },

    #[error("Orchestrator has been shut down")]
    ShutDown,

    #[error("Worker dropped request {target_id} without a result")]
    WorkerLost { target_id: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Fairway Scout operations
pub type Result<T> = std::result::Result<T, FairwayError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extractor::{DynamicExtractor, ScrapeStrategy, StaticExtractor};
pub use model::{
    ErrorType, ExtractedCourseFacts, ProcessingResult, ScrapeOptions, ScrapeTarget, ScrapingError,
};
pub use orchestrator::RequestOrchestrator;
pub use robots::PolicyGate;
pub use state::RequestState;
