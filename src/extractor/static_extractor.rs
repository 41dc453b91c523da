use crate::config::Config;
use crate::extractor::fetcher::PageFetcher;
use crate::extractor::pipeline::extract_page;
use crate::extractor::ScrapeStrategy;
use crate::model::{
    ErrorType, FetchMethod, ProcessingResult, ResultMetadata, ScrapeOptions, ScrapeTarget,
    ScrapingError,
};
use async_trait::async_trait;
use std::time::Instant;
use url::Url;

/// Content types the extraction pipeline can make sense of
const MARKUP_TYPES: &[&str] = &["html", "xml", "text/plain"];

/// Fetches raw HTML over HTTP and runs the extraction pipeline on it
pub struct StaticExtractor {
    fetcher: PageFetcher,
}

impl StaticExtractor {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(PageFetcher::from_config(config)?))
    }
}

#[async_trait]
impl ScrapeStrategy for StaticExtractor {
    fn method(&self) -> FetchMethod {
        FetchMethod::Static
    }

    async fn scrape_basic_info(
        &self,
        target: &ScrapeTarget,
        options: &ScrapeOptions,
    ) -> ProcessingResult {
        let started = Instant::now();
        let elapsed = || started.elapsed().as_millis() as u64;
        let fail = |error: ScrapingError, warnings: Vec<String>| {
            ProcessingResult::failure(&target.url, error, FetchMethod::Static, warnings, elapsed())
        };

        let url = match Url::parse(&target.url) {
            Ok(url) => url,
            Err(e) => {
                return fail(
                    ScrapingError::unknown(&target.url, "INVALID_URL", e.to_string()),
                    Vec::new(),
                )
            }
        };

        let page = match self.fetcher.fetch(&url, options).await {
            Ok(page) => page,
            Err(error) => return fail(error, Vec::new()),
        };

        let mut warnings = Vec::new();
        match page.status {
            200..=299 => {}
            403 | 404 | 429 | 500..=599 => {
                let mut result = fail(
                    ScrapingError::from_status(page.final_url.as_str(), page.status),
                    Vec::new(),
                );
                result.metadata.final_url = page.final_url.to_string();
                result.metadata.redirects = page.redirects;
                return result;
            }
            status => warnings.push(format!(
                "HTTP {} from {}; extracted anyway",
                status, page.final_url
            )),
        }

        if let Some(content_type) = page.content_type.as_deref() {
            let lower = content_type.to_ascii_lowercase();
            if !MARKUP_TYPES.iter().any(|t| lower.contains(t)) {
                return fail(
                    ScrapingError::new(
                        ErrorType::Parsing,
                        "UNSUPPORTED_CONTENT",
                        format!("cannot extract from {}", content_type),
                        page.final_url.as_str(),
                        false,
                    ),
                    warnings,
                );
            }
        }

        let extraction = extract_page(&page.body, &page.final_url, target);
        warnings.extend(extraction.warnings);

        let metadata = ResultMetadata {
            method: FetchMethod::Static,
            final_url: page.final_url.to_string(),
            redirects: page.redirects,
            response_size: page.body.len(),
            resources_loaded: 0,
        };

        ProcessingResult::success(extraction.facts, warnings, metadata, elapsed())
    }
}
