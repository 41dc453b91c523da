//! Extraction strategies
//!
//! This module contains the two ways of turning a [`ScrapeTarget`] into a
//! [`ProcessingResult`]:
//! - [`StaticExtractor`]: plain HTTP fetch of the raw HTML
//! - [`DynamicExtractor`]: browser-rendered DOM via a [`crate::renderer::Renderer`]
//!
//! Both feed the same extraction pipeline, so a given document yields the
//! same facts whichever way it was obtained.

mod contact;
mod dom;
mod dynamic_extractor;
mod fetcher;
mod images;
mod pipeline;
mod static_extractor;
pub mod text;

use crate::model::{FetchMethod, ProcessingResult, ScrapeOptions, ScrapeTarget};
use async_trait::async_trait;

pub use dynamic_extractor::DynamicExtractor;
pub use fetcher::{build_http_client, classify_error, FetchedPage, PageFetcher};
pub use images::{MAX_COURSE_MAP_IMAGES, MAX_GALLERY_IMAGES, MAX_HERO_IMAGES};
pub use pipeline::{confidence, extract_page, extract_page_at, PageExtraction, DEFAULT_HOLES, MAX_SCORE};
pub use static_extractor::StaticExtractor;

#[cfg(test)]
pub(crate) use dynamic_extractor::tests::FakeRenderer;

/// A way of fetching a page and extracting course facts from it
///
/// Implementations never return errors: every failure is classified into
/// the result's `errors`.
#[async_trait]
pub trait ScrapeStrategy: Send + Sync {
    fn method(&self) -> FetchMethod;

    /// Whether the strategy can currently serve requests
    fn is_available(&self) -> bool {
        true
    }

    async fn scrape_basic_info(
        &self,
        target: &ScrapeTarget,
        options: &ScrapeOptions,
    ) -> ProcessingResult;

    /// Releases held resources such as a browser process
    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
