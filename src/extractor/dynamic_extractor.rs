use crate::extractor::pipeline::extract_page;
use crate::extractor::ScrapeStrategy;
use crate::model::{
    FetchMethod, ProcessingResult, ResultMetadata, ScrapeOptions, ScrapeTarget, ScrapingError,
};
use crate::renderer::{NavigationTimeout, RenderContext, Renderer, RESOURCE_COUNT_SCRIPT};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Renders pages in a browser before running the extraction pipeline
pub struct DynamicExtractor {
    renderer: Arc<dyn Renderer>,
    default_timeout: Duration,
    screenshots: bool,
}

impl DynamicExtractor {
    /// # Arguments
    ///
    /// * `renderer` - Browser engine; shared with whoever shuts it down
    /// * `default_timeout` - Render budget when options carry none
    /// * `screenshots` - Capture a screenshot of every page
    pub fn new(renderer: Arc<dyn Renderer>, default_timeout: Duration, screenshots: bool) -> Self {
        Self {
            renderer,
            default_timeout,
            screenshots,
        }
    }

    fn timeout_for(&self, options: &ScrapeOptions) -> Duration {
        options.timeout().unwrap_or(self.default_timeout)
    }

    async fn render(
        &self,
        context: &mut dyn RenderContext,
        target: &ScrapeTarget,
        options: &ScrapeOptions,
        started: Instant,
    ) -> ProcessingResult {
        let timeout = self.timeout_for(options);
        let fail = |error: ScrapingError, warnings: Vec<String>| {
            ProcessingResult::failure(
                &target.url,
                error,
                FetchMethod::Dynamic,
                warnings,
                started.elapsed().as_millis() as u64,
            )
        };

        let mut warnings = Vec::new();
        if options.user_agent.is_some() || !options.headers.is_empty() {
            if let Err(e) = context
                .set_request_headers(options.user_agent.as_deref(), &options.headers)
                .await
            {
                warnings.push(format!("request headers not applied: {e}"));
            }
        }

        let navigation = match context.navigate(&target.url, timeout.as_millis() as u64).await {
            Ok(navigation) => navigation,
            Err(e) => {
                let error = if e.is::<NavigationTimeout>() {
                    ScrapingError::timeout(&target.url, timeout)
                } else {
                    ScrapingError::network(&target.url, "NAVIGATION_FAILED", e.to_string())
                };
                return fail(error, warnings);
            }
        };

        if matches!(navigation.status, 403 | 404 | 429 | 500..=599) {
            return fail(
                ScrapingError::from_status(&navigation.final_url, navigation.status),
                warnings,
            );
        }

        let html = match context.get_html().await {
            Ok(html) => html,
            Err(e) => {
                return fail(
                    ScrapingError::parsing(&target.url, format!("could not read rendered DOM: {e}")),
                    warnings,
                )
            }
        };

        if (400..500).contains(&navigation.status) {
            warnings.push(format!(
                "HTTP {} from {}; extracted anyway",
                navigation.status, navigation.final_url
            ));
        }

        let resources_loaded = match context.execute_js(RESOURCE_COUNT_SCRIPT).await {
            Ok(value) => value.as_u64().unwrap_or(0) as usize,
            Err(e) => {
                tracing::debug!(url = %target.url, error = %e, "Resource count unavailable");
                0
            }
        };

        let screenshot = if self.screenshots || options.screenshots {
            match context.screenshot().await {
                Ok(png) => Some(png),
                Err(e) => {
                    warnings.push(format!("screenshot failed: {e}"));
                    None
                }
            }
        } else {
            None
        };

        let final_url = Url::parse(&navigation.final_url)
            .or_else(|_| Url::parse(&target.url))
            .map_err(|e| ScrapingError::unknown(&target.url, "INVALID_URL", e.to_string()));
        let final_url = match final_url {
            Ok(url) => url,
            Err(error) => return fail(error, warnings),
        };

        let extraction = extract_page(&html, &final_url, target);
        warnings.extend(extraction.warnings);

        let metadata = ResultMetadata {
            method: FetchMethod::Dynamic,
            final_url: final_url.to_string(),
            redirects: navigation.redirect_chain,
            response_size: html.len(),
            resources_loaded,
        };

        let mut result = ProcessingResult::success(
            extraction.facts,
            warnings,
            metadata,
            started.elapsed().as_millis() as u64,
        );
        result.screenshot = screenshot;
        result
    }
}

/// Owns a render context and closes it even when the scrape is cancelled
struct ContextGuard {
    context: Option<Box<dyn RenderContext>>,
}

impl ContextGuard {
    async fn close(mut self, url: &str) {
        if let Some(context) = self.context.take() {
            if let Err(e) = context.close().await {
                tracing::warn!(url, error = %e, "Failed to close render context");
            }
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = context.close().await {
                        tracing::warn!(error = %e, "Failed to close abandoned render context");
                    }
                });
            }
            Err(_) => tracing::warn!("Render context dropped outside a runtime; left open"),
        }
    }
}

#[async_trait]
impl ScrapeStrategy for DynamicExtractor {
    fn method(&self) -> FetchMethod {
        FetchMethod::Dynamic
    }

    fn is_available(&self) -> bool {
        self.renderer.is_available()
    }

    async fn scrape_basic_info(
        &self,
        target: &ScrapeTarget,
        options: &ScrapeOptions,
    ) -> ProcessingResult {
        let started = Instant::now();

        let context = match self.renderer.new_context().await {
            Ok(context) => context,
            Err(e) => {
                return ProcessingResult::failure(
                    &target.url,
                    ScrapingError::unknown(&target.url, "RENDERER_UNAVAILABLE", e.to_string()),
                    FetchMethod::Dynamic,
                    Vec::new(),
                    started.elapsed().as_millis() as u64,
                )
            }
        };

        let timeout = self.timeout_for(options);
        let mut guard = ContextGuard {
            context: Some(context),
        };
        let rendered = match guard.context.as_deref_mut() {
            Some(context) => {
                tokio::time::timeout(timeout, self.render(context, target, options, started))
                    .await
                    .ok()
            }
            None => None,
        };
        guard.close(&target.url).await;

        rendered.unwrap_or_else(|| {
            ProcessingResult::failure(
                &target.url,
                ScrapingError::timeout(&target.url, timeout),
                FetchMethod::Dynamic,
                Vec::new(),
                started.elapsed().as_millis() as u64,
            )
        })
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        self.renderer.shutdown().await
    }
}
