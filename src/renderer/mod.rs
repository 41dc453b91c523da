//! Renderer abstraction for browser-based page rendering
//!
//! Defines the `Renderer` and `RenderContext` traits used by the dynamic
//! extraction strategy. A Chromium implementation is compiled in with the
//! `chromium` feature; without it only [`NoopRenderer`] is available and the
//! orchestrator falls back to static fetching.

#[cfg(feature = "chromium")]
pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Script counting the sub-resources a rendered page loaded
pub const RESOURCE_COUNT_SCRIPT: &str = "performance.getEntriesByType('resource').length";

/// Result of navigating to a URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects
    pub final_url: String,
    /// HTTP status code, when the engine exposes it
    pub status: u16,
    /// Chain of redirect URLs
    pub redirect_chain: Vec<String>,
    pub load_time_ms: u64,
}

/// Navigation did not finish within its budget
///
/// Returned inside the `anyhow::Error` from [`RenderContext::navigate`] so
/// callers can tell a timeout apart from other navigation failures.
#[derive(Debug, Error)]
#[error("navigation timed out after {after_ms}ms")]
pub struct NavigationTimeout {
    pub after_ms: u64,
}

/// A browser engine that can create rendering contexts
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab)
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts
    fn active_contexts(&self) -> usize;
    /// Whether contexts can be created at all
    fn is_available(&self) -> bool {
        true
    }
}

/// A single browser context (tab) for rendering pages
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Overrides the user agent and adds headers for later requests
    async fn set_request_headers(
        &mut self,
        user_agent: Option<&str>,
        headers: &BTreeMap<String, String>,
    ) -> Result<()>;
    /// Navigate to a URL with a timeout
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML
    async fn get_html(&self) -> Result<String>;
    /// Capture a full-page PNG
    async fn screenshot(&self) -> Result<Vec<u8>>;
    /// Close this context
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A renderer that is never available
///
/// Used when no browser is configured. Dynamic requests are then served by
/// the static strategy with a warning.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("browser not available, static-only mode"))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        0
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_renderer_unavailable() {
        let renderer = NoopRenderer;
        assert!(!renderer.is_available());
        assert!(renderer.new_context().await.is_err());
        assert_eq!(renderer.active_contexts(), 0);
        assert!(renderer.shutdown().await.is_ok());
    }

    #[test]
    fn test_navigation_timeout_survives_anyhow() {
        let err: anyhow::Error = NavigationTimeout { after_ms: 250 }.into();
        assert!(err.is::<NavigationTimeout>());
        assert_eq!(err.to_string(), "navigation timed out after 250ms");

        let other = anyhow::anyhow!("navigation timed out after 250ms");
        assert!(!other.is::<NavigationTimeout>());
    }
}
