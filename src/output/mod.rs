//! Output module for batch results and reports
//!
//! This module handles:
//! - Writing processing results as JSON lines
//! - Persisting captured screenshots
//! - Generating a markdown summary of a batch
//! - Printing orchestrator statistics

mod markdown;
mod results;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary, BatchSummary, FailureLine};
pub use results::{screenshot_file_name, write_results, write_screenshots, ResultRecord};
pub use stats::{format_statistics, print_statistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
