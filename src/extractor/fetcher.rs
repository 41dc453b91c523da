//! HTTP fetcher for the static strategy
//!
//! This module handles all raw page requests:
//! - Building the HTTP client with our user agent
//! - Browser-like request headers plus per-request overrides
//! - Manual redirect handling with loop and hop-limit detection
//! - Error classification into [`ScrapingError`]

use crate::config::Config;
use crate::model::{ErrorType, ScrapeOptions, ScrapingError};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::{redirect::Policy, Client, Response};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_DEFAULT: &str = "en-US,en;q=0.9";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A response that ended the redirect chain
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after following redirects
    pub final_url: Url,
    pub status: u16,
    pub body: String,
    /// Every URL redirected through, in order, excluding the final one
    pub redirects: Vec<String>,
    pub content_type: Option<String>,
}

/// Builds the HTTP client used for page requests
///
/// Redirects are disabled at the client level and followed by
/// [`PageFetcher::fetch`] so the chain can be recorded.
///
/// # Example
///
/// ```no_run
/// use fairway_scout::config::load_config;
/// use fairway_scout::extractor::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("fairway.toml")).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues GET requests and follows redirects by hand
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    max_redirects: usize,
    default_timeout: Duration,
}

impl PageFetcher {
    /// # Arguments
    ///
    /// * `client` - Client built with redirects disabled
    /// * `max_redirects` - Hops followed before giving up
    /// * `default_timeout` - Per-request timeout when options carry none
    pub fn new(client: Client, max_redirects: usize, default_timeout: Duration) -> Self {
        Self {
            client,
            max_redirects,
            default_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            config.scraper.max_redirects,
            config.scraper.request_timeout(),
        ))
    }

    /// Fetches `url`, following up to `max_redirects` hops
    ///
    /// # Redirect handling
    ///
    /// | Condition | Error code |
    /// |-----------|------------|
    /// | URL seen twice in the chain | `REDIRECT_LOOP` |
    /// | More than `max_redirects` hops | `TOO_MANY_REDIRECTS` |
    /// | 3xx without a usable `Location` | `BAD_REDIRECT` |
    ///
    /// Any non-redirect status is returned as a page; classifying it is the
    /// caller's job.
    pub async fn fetch(
        &self,
        url: &Url,
        options: &ScrapeOptions,
    ) -> Result<FetchedPage, ScrapingError> {
        let timeout = options.timeout().unwrap_or(self.default_timeout);
        let mut current = url.clone();
        let mut redirects: Vec<String> = Vec::new();
        let mut visited = HashSet::from([current.to_string()]);

        loop {
            let response = self.send(&current, options, timeout).await?;
            let status = response.status();

            if !status.is_redirection() {
                return read_page(response, current, redirects, timeout).await;
            }

            let next = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| current.join(location).ok())
                .ok_or_else(|| {
                    redirect_error(
                        url,
                        "BAD_REDIRECT",
                        format!("{} from {} without a usable Location", status, current),
                    )
                })?;

            tracing::debug!(from = %current, to = %next, status = status.as_u16(), "Following redirect");

            if !visited.insert(next.to_string()) {
                return Err(redirect_error(
                    url,
                    "REDIRECT_LOOP",
                    format!("redirect loop at {}", next),
                ));
            }

            redirects.push(current.to_string());
            if redirects.len() > self.max_redirects {
                return Err(redirect_error(
                    url,
                    "TOO_MANY_REDIRECTS",
                    format!("more than {} redirects", self.max_redirects),
                ));
            }

            current = next;
        }
    }

    async fn send(
        &self,
        url: &Url,
        options: &ScrapeOptions,
        timeout: Duration,
    ) -> Result<Response, ScrapingError> {
        let mut request = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_DEFAULT);

        if let Some(agent) = &options.user_agent {
            request = request.header(USER_AGENT, agent.as_str());
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        request
            .send()
            .await
            .map_err(|e| classify_error(url.as_str(), &e, timeout))
    }
}

async fn read_page(
    response: Response,
    final_url: Url,
    redirects: Vec<String>,
    timeout: Duration,
) -> Result<FetchedPage, ScrapingError> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response
        .text()
        .await
        .map_err(|e| classify_error(final_url.as_str(), &e, timeout))?;

    Ok(FetchedPage {
        final_url,
        status,
        body,
        redirects,
        content_type,
    })
}

fn redirect_error(url: &Url, code: &str, message: String) -> ScrapingError {
    ScrapingError::new(ErrorType::Network, code, message, url.as_str(), false)
}

/// Maps a transport error to a classified scrape error
///
/// | reqwest error | Result |
/// |---------------|--------|
/// | timeout | `TIMEOUT`, retryable |
/// | connect (refused, DNS, TLS) | `CONNECTION_FAILED`, retryable |
/// | builder (bad header, bad URL) | `INVALID_REQUEST`, unknown |
/// | body decode | `BODY_READ_FAILED`, retryable |
/// | anything else | `REQUEST_FAILED`, retryable |
pub fn classify_error(url: &str, error: &reqwest::Error, timeout: Duration) -> ScrapingError {
    if error.is_timeout() {
        ScrapingError::timeout(url, timeout)
    } else if error.is_connect() {
        ScrapingError::network(url, "CONNECTION_FAILED", error.to_string())
    } else if error.is_builder() {
        ScrapingError::unknown(url, "INVALID_REQUEST", error.to_string())
    } else if error.is_body() || error.is_decode() {
        ScrapingError::network(url, "BODY_READ_FAILED", error.to_string())
    } else {
        ScrapingError::network(url, "REQUEST_FAILED", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(max_redirects: usize) -> PageFetcher {
        let client = Client::builder().redirect(Policy::none()).build().unwrap();
        PageFetcher::new(client, max_redirects, Duration::from_secs(5))
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/course"))
            .and(header("x-api-key", "abc"))
            .and(header("user-agent", "CustomBot/2.0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<h1>Hi</h1>", "text/html; charset=utf-8"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let options = ScrapeOptions {
            user_agent: Some("CustomBot/2.0".to_string()),
            ..ScrapeOptions::default()
        }
        .with_header("x-api-key", "abc");

        let page = fetcher(5)
            .fetch(&url(&server, "/course"), &options)
            .await
            .unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<h1>Hi</h1>");
        assert!(page.redirects.is_empty());
        assert!(page.content_type.unwrap().starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_redirect_chain_recorded() {
        let server = MockServer::start().await;
        Mock::given(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/mid"))
            .mount(&server)
            .await;
        Mock::given(path("/mid"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .mount(&server)
            .await;

        let page = fetcher(5)
            .fetch(&url(&server, "/old"), &ScrapeOptions::default())
            .await
            .unwrap();
        assert_eq!(page.final_url, url(&server, "/new"));
        assert_eq!(
            page.redirects,
            vec![url(&server, "/old").to_string(), url(&server, "/mid").to_string()]
        );
    }

    #[tokio::test]
    async fn test_redirect_loop_detected() {
        let server = MockServer::start().await;
        Mock::given(path("/a"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/b"))
            .mount(&server)
            .await;
        Mock::given(path("/b"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/a"))
            .mount(&server)
            .await;

        let err = fetcher(5)
            .fetch(&url(&server, "/a"), &ScrapeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, "REDIRECT_LOOP");
        assert!(!err.retryable);
    }

    #[tokio::test]
    async fn test_too_many_redirects() {
        let server = MockServer::start().await;
        for i in 0..4 {
            Mock::given(path(format!("/r{}", i)))
                .respond_with(
                    ResponseTemplate::new(302).insert_header("location", format!("/r{}", i + 1).as_str()),
                )
                .mount(&server)
                .await;
        }

        let err = fetcher(2)
            .fetch(&url(&server, "/r0"), &ScrapeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, "TOO_MANY_REDIRECTS");
    }

    #[tokio::test]
    async fn test_redirect_without_location() {
        let server = MockServer::start().await;
        Mock::given(path("/x"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let err = fetcher(5)
            .fetch(&url(&server, "/x"), &ScrapeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, "BAD_REDIRECT");
    }

    #[tokio::test]
    async fn test_error_status_returned_as_page() {
        let server = MockServer::start().await;
        Mock::given(path("/gone"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let page = fetcher(5)
            .fetch(&url(&server, "/gone"), &ScrapeOptions::default())
            .await
            .unwrap();
        assert_eq!(page.status, 503);
    }

    #[tokio::test]
    async fn test_timeout_classified() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let options = ScrapeOptions::default().with_timeout(Duration::from_millis(50));
        let err = fetcher(5)
            .fetch(&url(&server, "/slow"), &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorType::Network);
        assert_eq!(err.code, "TIMEOUT");
        assert!(err.retryable);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Nothing listens on port 1
        let target = Url::parse("http://127.0.0.1:1/").unwrap();

        let err = fetcher(5)
            .fetch(&target, &ScrapeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, "CONNECTION_FAILED");
        assert!(err.retryable);
    }
}
