use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure classes reported in [`ScrapingError::kind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorType {
    /// Connection failures, 5xx responses, client errors and attempt timeouts
    Network,
    /// Accepted on input for compatibility; the engine reports attempt
    /// timeouts as `Network` with code `TIMEOUT`
    Timeout,
    /// Malformed or unexpected content
    Parsing,
    /// robots.txt forbids the path for our user agent
    RobotsDisallowed,
    /// HTTP 429
    RateLimited,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Parsing => "parsing",
            Self::RobotsDisallowed => "robots-disallowed",
            Self::RateLimited => "rate-limited",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified scrape failure
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind} error ({code}) for {url}: {message}")]
pub struct ScrapingError {
    #[serde(rename = "type")]
    pub kind: ErrorType,
    pub code: String,
    pub message: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub retryable: bool,
}

impl ScrapingError {
    pub fn new(
        kind: ErrorType,
        code: impl Into<String>,
        message: impl Into<String>,
        url: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            url: url.into(),
            status_code: None,
            retryable,
        }
    }

    /// Connection-level failure; transient
    pub fn network(url: &str, code: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorType::Network, code, message, url, true)
    }

    /// Attempt exceeded its time budget; transient
    pub fn timeout(url: &str, after: Duration) -> Self {
        Self::new(
            ErrorType::Network,
            "TIMEOUT",
            format!("request timed out after {}ms", after.as_millis()),
            url,
            true,
        )
    }

    /// Classifies an HTTP error status
    ///
    /// | Status | Kind | Retryable |
    /// |--------|------|-----------|
    /// | 429 | rate-limited | yes |
    /// | 5xx | network | yes |
    /// | 403, 404 | network | no |
    /// | other 4xx | network | no |
    pub fn from_status(url: &str, status: u16) -> Self {
        let (kind, retryable) = match status {
            429 => (ErrorType::RateLimited, true),
            500..=599 => (ErrorType::Network, true),
            _ => (ErrorType::Network, false),
        };

        let mut error = Self::new(
            kind,
            format!("HTTP_{}", status),
            format!("server responded with HTTP {}", status),
            url,
            retryable,
        );
        error.status_code = Some(status);
        error
    }

    /// Content could not be processed; permanent
    pub fn parsing(url: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorType::Parsing, "PARSE_ERROR", message, url, false)
    }

    /// robots.txt forbids the request; permanent
    pub fn robots_disallowed(url: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorType::RobotsDisallowed,
            "ROBOTS_DISALLOWED",
            reason,
            url,
            false,
        )
    }

    /// Unclassified failure; permanent
    pub fn unknown(url: &str, code: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorType::Unknown, code, message, url, false)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorType::Timeout || self.code == "TIMEOUT"
    }
}

/// Fetching strategy that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    Static,
    Dynamic,
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Contact details found on a course page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub booking_url: Option<String>,
}

/// Absolute image URLs bucketed by role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseImages {
    pub hero: Vec<String>,
    pub gallery: Vec<String>,
    pub course_map: Vec<String>,
}

impl CourseImages {
    pub fn total(&self) -> usize {
        self.hero.len() + self.gallery.len() + self.course_map.len()
    }
}

/// Facts extracted from one course page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedCourseFacts {
    /// Never empty: falls back to the target's name
    pub name: String,
    pub description: Option<String>,
    pub architect: Option<String>,
    pub opening_year: Option<u16>,
    pub total_yardage: Option<u32>,
    pub par_score: Option<u8>,
    pub number_of_holes: u8,
    pub green_fees_price_range: Option<String>,
    pub contact: ContactInfo,
    pub images: CourseImages,
    /// 0..=100
    pub confidence: u8,
    pub extracted_at: DateTime<Utc>,
    pub source: String,
}

/// Transport details of the attempt that produced a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub method: FetchMethod,
    pub final_url: String,
    pub redirects: Vec<String>,
    pub response_size: usize,
    pub resources_loaded: usize,
}

impl ResultMetadata {
    /// Metadata for an attempt that produced no response
    pub fn empty(method: FetchMethod, url: &str) -> Self {
        Self {
            method,
            final_url: url.to_string(),
            redirects: Vec::new(),
            response_size: 0,
            resources_loaded: 0,
        }
    }
}

/// Terminal outcome of one scrape submission
///
/// Build through [`ProcessingResult::success`] or [`ProcessingResult::failure`];
/// a failed result always carries at least one error and zero confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub success: bool,
    pub data: Option<ExtractedCourseFacts>,
    pub contact: Option<ContactInfo>,
    pub images: Option<CourseImages>,
    pub errors: Vec<ScrapingError>,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
    /// 0..=100
    pub confidence: u8,
    pub source: String,
    pub metadata: ResultMetadata,
    /// Number of fetch attempts spent on this result
    #[serde(default)]
    pub attempts: u32,
    /// PNG bytes captured by the dynamic strategy
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,
}

impl ProcessingResult {
    pub fn success(
        facts: ExtractedCourseFacts,
        warnings: Vec<String>,
        metadata: ResultMetadata,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: true,
            contact: Some(facts.contact.clone()),
            images: Some(facts.images.clone()),
            confidence: facts.confidence.min(100),
            source: facts.source.clone(),
            data: Some(facts),
            errors: Vec::new(),
            warnings,
            processing_time_ms,
            metadata,
            attempts: 1,
            screenshot: None,
        }
    }

    pub fn failure(
        source: &str,
        error: ScrapingError,
        method: FetchMethod,
        warnings: Vec<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: false,
            data: None,
            contact: None,
            images: None,
            errors: vec![error],
            warnings,
            processing_time_ms,
            confidence: 0,
            source: source.to_string(),
            metadata: ResultMetadata::empty(method, source),
            attempts: 1,
            screenshot: None,
        }
    }

    /// The error that decided this result, if it failed
    pub fn primary_error(&self) -> Option<&ScrapingError> {
        self.errors.first()
    }

    /// Whether another attempt could change the outcome
    pub fn is_retryable(&self) -> bool {
        !self.success && self.errors.iter().all(|e| e.retryable) && !self.errors.is_empty()
    }

    pub fn method(&self) -> FetchMethod {
        self.metadata.method
    }
}
