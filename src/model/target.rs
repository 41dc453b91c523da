use crate::model::ProcessingResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Queue priority of a scrape target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Numeric rank, lower values are served first
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

/// Kind of site a target points at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// The course's own website
    #[default]
    Official,
    /// A listing/aggregator site, usually script-rendered
    Directory,
    /// Forums, reviews and other user-generated pages
    Community,
}

/// Per-field CSS selectors tried before the built-in candidates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorHints {
    pub name: Vec<String>,
    pub description: Vec<String>,
    pub architect: Vec<String>,
    pub opening_year: Vec<String>,
    pub total_yardage: Vec<String>,
    pub par_score: Vec<String>,
    pub number_of_holes: Vec<String>,
    pub green_fees: Vec<String>,
    pub phone: Vec<String>,
    pub email: Vec<String>,
    pub address: Vec<String>,
    pub booking_url: Vec<String>,
    pub hero_images: Vec<String>,
    pub gallery_images: Vec<String>,
    pub course_map_images: Vec<String>,
}

/// Running history of scrapes against one target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetMetadata {
    pub success_count: u32,
    pub failure_count: u32,
    pub avg_response_time_ms: f64,
    pub last_scraped: Option<DateTime<Utc>>,
}

/// A page to scrape, created by the batch driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeTarget {
    pub id: String,
    /// Course name; used as the fallback when the page yields none
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub selectors: SelectorHints,
    #[serde(default)]
    pub metadata: TargetMetadata,
}

impl ScrapeTarget {
    /// Creates a target with medium priority, official source type and no hints
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            priority: Priority::default(),
            source_type: SourceType::default(),
            selectors: SelectorHints::default(),
            metadata: TargetMetadata::default(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_selectors(mut self, selectors: SelectorHints) -> Self {
        self.selectors = selectors;
        self
    }

    /// Folds a terminal result into this target's history
    pub fn record_outcome(&mut self, result: &ProcessingResult) {
        let meta = &mut self.metadata;
        let previous = f64::from(meta.success_count + meta.failure_count);

        if result.success {
            meta.success_count += 1;
        } else {
            meta.failure_count += 1;
        }

        meta.avg_response_time_ms = (meta.avg_response_time_ms * previous
            + result.processing_time_ms as f64)
            / (previous + 1.0);
        meta.last_scraped = Some(Utc::now());
    }
}

/// Per-request knobs supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeOptions {
    /// Per-attempt timeout; the configured default applies when unset
    pub timeout_ms: Option<u64>,
    /// Force the dynamic (rendered) strategy
    pub javascript: bool,
    /// Capture a screenshot when rendering
    pub screenshots: bool,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// Override for the `User-Agent` header
    pub user_agent: Option<String>,
}

impl ScrapeOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_javascript(mut self, javascript: bool) -> Self {
        self.javascript = javascript;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FetchMethod, ScrapingError};

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn test_target_deserializes_with_defaults() {
        let json = r#"{"id":"t1","name":"Test Links","url":"https://example.com/"}"#;
        let target: ScrapeTarget = serde_json::from_str(json).unwrap();
        assert_eq!(target.priority, Priority::Medium);
        assert_eq!(target.source_type, SourceType::Official);
        assert!(target.selectors.name.is_empty());
        assert_eq!(target.metadata.success_count, 0);
    }

    #[test]
    fn test_source_type_serializes_lowercase() {
        let json = serde_json::to_string(&SourceType::Directory).unwrap();
        assert_eq!(json, "\"directory\"");
    }

    #[test]
    fn test_record_outcome_updates_history() {
        let mut target = ScrapeTarget::new("t1", "Test Links", "https://example.com/");

        let mut ok = ProcessingResult::failure(
            &target.url,
            ScrapingError::parsing(&target.url, "boom"),
            FetchMethod::Static,
            Vec::new(),
            100,
        );
        ok.success = true;
        target.record_outcome(&ok);

        let failed = ProcessingResult::failure(
            &target.url,
            ScrapingError::parsing(&target.url, "boom"),
            FetchMethod::Static,
            Vec::new(),
            300,
        );
        target.record_outcome(&failed);

        assert_eq!(target.metadata.success_count, 1);
        assert_eq!(target.metadata.failure_count, 1);
        assert!((target.metadata.avg_response_time_ms - 200.0).abs() < f64::EPSILON);
        assert!(target.metadata.last_scraped.is_some());
    }

    #[test]
    fn test_options_timeout() {
        let options = ScrapeOptions::default().with_timeout(Duration::from_secs(5));
        assert_eq!(options.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(ScrapeOptions::default().timeout(), None);
    }
}
