//! Data model shared by the extractors, the orchestrator and the batch driver
//!
//! Everything here serializes with camelCase field names so JSON output
//! lines up with the downstream content pipeline's vocabulary.

mod result;
mod target;

pub use result::{
    ContactInfo, CourseImages, ErrorType, ExtractedCourseFacts, FetchMethod, ProcessingResult,
    ResultMetadata, ScrapingError,
};
pub use target::{
    Priority, ScrapeOptions, ScrapeTarget, SelectorHints, SourceType, TargetMetadata,
};
