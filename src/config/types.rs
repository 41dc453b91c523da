use crate::model::{Priority, ScrapeTarget, SelectorHints, SourceType, TargetMetadata};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Fairway Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetEntry>,
}

impl Config {
    /// Converts the configured `[[target]]` tables into scrape targets
    pub fn scrape_targets(&self) -> Vec<ScrapeTarget> {
        self.targets.iter().map(TargetEntry::to_target).collect()
    }
}

/// Request orchestration and politeness configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScraperConfig {
    /// Number of workers draining the request queue
    pub max_concurrent_requests: usize,

    /// Maximum number of queued requests before `add_request` waits
    pub queue_limit: usize,

    /// Per-attempt timeout (milliseconds)
    pub request_timeout_ms: u64,

    /// Spacing between requests to one origin when robots.txt declares no crawl-delay (milliseconds)
    pub default_crawl_delay_ms: u64,

    /// Upper bound applied to robots.txt crawl-delay values (milliseconds)
    pub max_crawl_delay_ms: u64,

    /// Total attempts per submission, including the first
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts (milliseconds)
    pub backoff_base_ms: u64,

    /// Maximum redirect hops followed by the static fetcher
    pub max_redirects: usize,

    /// Static results below this confidence are retried through the dynamic strategy
    pub dynamic_confidence_threshold: u8,

    /// How long a fetched robots.txt stays valid (hours)
    pub robots_cache_ttl_hours: i64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 3,
            queue_limit: 100,
            request_timeout_ms: 30_000,
            default_crawl_delay_ms: 2_000,
            max_crawl_delay_ms: 60_000,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            max_redirects: 5,
            dynamic_confidence_threshold: 30,
            robots_cache_ttl_hours: 24,
        }
    }
}

impl ScraperConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn default_crawl_delay(&self) -> Duration {
        Duration::from_millis(self.default_crawl_delay_ms)
    }

    pub fn max_crawl_delay(&self) -> Duration {
        Duration::from_millis(self.max_crawl_delay_ms)
    }

    pub fn robots_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.robots_cache_ttl_hours)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Full `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }

    /// Product token used when matching robots.txt `User-agent` lines
    pub fn robots_token(&self) -> &str {
        &self.crawler_name
    }
}

/// Headless browser configuration for the dynamic strategy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BrowserConfig {
    /// Launch a headless browser for JavaScript-heavy targets
    pub enabled: bool,

    /// Capture a screenshot of every rendered page
    pub screenshots: bool,

    /// Explicit browser executable; auto-detected when absent
    pub executable: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// JSON-lines file receiving one processing result per target
    pub results_path: String,

    /// Markdown batch summary
    pub summary_path: String,

    /// Directory for captured screenshots
    pub screenshot_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "./results.jsonl".to_string(),
            summary_path: "./summary.md".to_string(),
            screenshot_dir: "./screenshots".to_string(),
        }
    }
}

/// A `[[target]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetEntry {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub selectors: SelectorEntry,
}

impl TargetEntry {
    pub fn to_target(&self) -> ScrapeTarget {
        ScrapeTarget {
            id: self.id.clone(),
            name: self.name.clone(),
            url: self.url.clone(),
            priority: self.priority,
            source_type: self.source_type,
            selectors: self.selectors.clone().into(),
            metadata: TargetMetadata::default(),
        }
    }
}

/// Per-field selector hints in a `[target.selectors]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorEntry {
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

impl From<SelectorEntry> for SelectorHints {
    fn from(entry: SelectorEntry) -> Self {
        SelectorHints {
            name: entry.name,
            description: entry.description,
            architect: entry.architect,
            opening_year: entry.opening_year,
            total_yardage: entry.total_yardage,
            par_score: entry.par_score,
            number_of_holes: entry.number_of_holes,
            green_fees: entry.green_fees,
            phone: entry.phone,
            email: entry.email,
            address: entry.address,
            booking_url: entry.booking_url,
            hero_images: entry.hero_images,
            gallery_images: entry.gallery_images,
            course_map_images: entry.course_map_images,
        }
    }
}
