use crate::config::Config;
use crate::robots::{CachedRobots, ParsedRobots, RobotsSource};
use crate::url::extract_origin;
use chrono::{DateTime, Utc};
use reqwest::{redirect::Policy, Client};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Timeout for a single robots.txt request
const ROBOTS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a [`PolicyGate::can_scrape`] check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDecision {
    pub allowed: bool,
    pub checked_at: DateTime<Utc>,
    /// Why the request was refused; `None` when allowed
    pub reason: Option<String>,
}

/// Summary of an origin's robots.txt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsInfo {
    pub exists: bool,
    pub last_checked: DateTime<Utc>,
    /// Seconds
    pub crawl_delay: Option<f64>,
    pub sitemaps: Vec<String>,
}

/// Rules in force for an origin and our user agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsPolicy {
    pub origin: String,
    pub fetched_at: DateTime<Utc>,
    pub ttl_expiry: DateTime<Utc>,
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    pub crawl_delay_seconds: Option<f64>,
    pub sitemaps: Vec<String>,
}

type Slot = Arc<OnceCell<Arc<CachedRobots>>>;

/// robots.txt gate shared by every worker
///
/// Each origin's robots.txt is fetched at most once per TTL. Concurrent
/// callers for an uncached origin wait on the same fetch.
pub struct PolicyGate {
    client: Client,
    product_token: String,
    ttl: chrono::Duration,
    cache: Mutex<HashMap<String, Slot>>,
    fetches: AtomicUsize,
}

impl PolicyGate {
    /// Creates a gate around an existing HTTP client
    ///
    /// # Arguments
    ///
    /// * `client` - Client used for robots.txt requests
    /// * `product_token` - Name matched against `User-agent` groups
    /// * `ttl` - Lifetime of a fetched robots.txt
    pub fn new(client: Client, product_token: impl Into<String>, ttl: chrono::Duration) -> Self {
        Self {
            client,
            product_token: product_token.into(),
            ttl,
            cache: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Builds a gate from the configured user agent and cache TTL
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.header_value())
            .timeout(ROBOTS_FETCH_TIMEOUT.min(config.scraper.request_timeout()))
            .redirect(Policy::limited(config.scraper.max_redirects))
            .gzip(true)
            .build()?;

        Ok(Self::new(
            client,
            config.user_agent.robots_token(),
            config.scraper.robots_ttl(),
        ))
    }

    pub fn product_token(&self) -> &str {
        &self.product_token
    }

    /// Decides whether `url` may be fetched
    ///
    /// Unparseable URLs are refused. A robots.txt that cannot be retrieved
    /// places no restrictions on the origin.
    pub async fn can_scrape(&self, url: &str) -> PolicyDecision {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return Self::refuse(format!("invalid URL {}: {}", url, e)),
        };

        let Some(origin) = extract_origin(&parsed) else {
            return Self::refuse(format!("URL {} has no network origin", url));
        };

        let robots = self.load(&origin).await;
        if robots.is_allowed(parsed.as_str(), &self.product_token) {
            PolicyDecision {
                allowed: true,
                checked_at: Utc::now(),
                reason: None,
            }
        } else {
            tracing::debug!(url, origin = %origin, "Disallowed by robots.txt");
            Self::refuse(format!(
                "{}/robots.txt disallows {} for {}",
                origin,
                parsed.path(),
                self.product_token
            ))
        }
    }

    /// Returns existence, crawl-delay and sitemaps for an origin
    ///
    /// `origin` may be a bare origin or any URL on it.
    pub async fn get_robots_info(&self, origin: &str) -> RobotsInfo {
        let robots = self.load(&origin_key(origin)).await;
        RobotsInfo {
            exists: robots.exists(),
            last_checked: robots.fetched_at,
            crawl_delay: robots.crawl_delay(&self.product_token),
            sitemaps: robots.content.sitemaps(),
        }
    }

    /// Crawl-delay declared for our user agent, if any
    pub async fn crawl_delay(&self, origin: &str) -> Option<Duration> {
        let robots = self.load(&origin_key(origin)).await;
        robots
            .crawl_delay(&self.product_token)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Rule lists of the group that applies to our user agent
    pub async fn policy(&self, origin: &str) -> RobotsPolicy {
        let origin = origin_key(origin);
        let robots = self.load(&origin).await;
        let group = robots.content.group_for(&self.product_token);

        RobotsPolicy {
            origin,
            fetched_at: robots.fetched_at,
            ttl_expiry: robots.expires_at,
            allow: group.allow,
            disallow: group.disallow,
            crawl_delay_seconds: group.crawl_delay,
            sitemaps: robots.content.sitemaps(),
        }
    }

    /// Number of robots.txt requests sent so far
    pub fn robots_fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn refuse(reason: String) -> PolicyDecision {
        PolicyDecision {
            allowed: false,
            checked_at: Utc::now(),
            reason: Some(reason),
        }
    }

    /// Returns the cached entry, fetching it when missing or stale
    async fn load(&self, origin: &str) -> Arc<CachedRobots> {
        let slot = {
            let mut cache = self
                .cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let slot = cache
                .entry(origin.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()));

            // Stale entries are replaced; callers already holding the old
            // slot keep using it until they finish
            if slot.get().is_some_and(|cached| cached.is_stale()) {
                *slot = Arc::new(OnceCell::new());
            }
            Arc::clone(slot)
        };

        slot.get_or_init(|| async { Arc::new(self.fetch(origin).await) })
            .await
            .clone()
    }

    async fn fetch(&self, origin: &str) -> CachedRobots {
        let robots_url = format!("{}/robots.txt", origin);
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(url = %robots_url, "Fetching robots.txt");

        let (content, source) = match self.client.get(&robots_url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    match response.text().await {
                        Ok(body) => (ParsedRobots::from_content(&body), RobotsSource::Fetched),
                        Err(e) => {
                            tracing::warn!(url = %robots_url, error = %e, "Failed to read robots.txt body, allowing all");
                            (ParsedRobots::allow_all(), RobotsSource::Unreachable)
                        }
                    }
                } else if status.is_client_error() && status.as_u16() != 429 {
                    tracing::debug!(url = %robots_url, status = status.as_u16(), "No robots.txt, allowing all");
                    (ParsedRobots::allow_all(), RobotsSource::Missing)
                } else {
                    tracing::warn!(url = %robots_url, status = status.as_u16(), "robots.txt unavailable, allowing all");
                    (ParsedRobots::allow_all(), RobotsSource::Unreachable)
                }
            }
            Err(e) => {
                tracing::warn!(url = %robots_url, error = %e, "Failed to fetch robots.txt, allowing all");
                (ParsedRobots::allow_all(), RobotsSource::Unreachable)
            }
        };

        CachedRobots::new(content, source, self.ttl)
    }
}

/// Reduces an origin or URL to its `scheme://host[:port]` cache key
fn origin_key(input: &str) -> String {
    Url::parse(input)
        .ok()
        .and_then(|url| extract_origin(&url))
        .unwrap_or_else(|| input.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gate(ttl: chrono::Duration) -> PolicyGate {
        PolicyGate::new(Client::new(), "FairwayBot", ttl)
    }

    async fn serve_robots(server: &MockServer, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_disallowed_path_refused() {
        let server = MockServer::start().await;
        serve_robots(&server, 200, "User-agent: *\nDisallow: /private\n").await;
        let gate = gate(chrono::Duration::hours(24));

        let denied = gate.can_scrape(&format!("{}/private/page", server.uri())).await;
        assert!(!denied.allowed);
        assert!(denied.reason.is_some());

        let allowed = gate.can_scrape(&format!("{}/courses/north", server.uri())).await;
        assert!(allowed.allowed);
        assert!(allowed.reason.is_none());
        assert_eq!(gate.robots_fetches(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_checks_share_one_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("User-agent: *\nAllow: /\n")
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gate = gate(chrono::Duration::hours(24));
        let urls: Vec<String> = (0..5).map(|i| format!("{}/page/{}", server.uri(), i)).collect();
        let decisions = futures::future::join_all(urls.iter().map(|u| gate.can_scrape(u))).await;

        assert!(decisions.iter().all(|d| d.allowed));
        assert_eq!(gate.robots_fetches(), 1);
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;
        serve_robots(&server, 404, "").await;
        let gate = gate(chrono::Duration::hours(24));

        assert!(gate.can_scrape(&format!("{}/anything", server.uri())).await.allowed);
        let info = gate.get_robots_info(&server.uri()).await;
        assert!(!info.exists);
        assert!(info.sitemaps.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_fails_open() {
        let server = MockServer::start().await;
        serve_robots(&server, 503, "").await;
        let gate = gate(chrono::Duration::hours(24));

        assert!(gate.can_scrape(&format!("{}/x", server.uri())).await.allowed);
    }

    #[tokio::test]
    async fn test_stale_entry_refetched() {
        let server = MockServer::start().await;
        serve_robots(&server, 200, "User-agent: *\nDisallow:\n").await;
        let gate = gate(chrono::Duration::zero());

        gate.can_scrape(&format!("{}/a", server.uri())).await;
        gate.can_scrape(&format!("{}/b", server.uri())).await;
        assert_eq!(gate.robots_fetches(), 2);
    }

    #[tokio::test]
    async fn test_info_and_policy() {
        let server = MockServer::start().await;
        let body = format!(
            "User-agent: fairwaybot\nDisallow: /members\nCrawl-delay: 3\n\nSitemap: {}/sitemap.xml\n",
            server.uri()
        );
        serve_robots(&server, 200, &body).await;
        let gate = gate(chrono::Duration::hours(24));

        let info = gate.get_robots_info(&format!("{}/some/page", server.uri())).await;
        assert!(info.exists);
        assert_eq!(info.crawl_delay, Some(3.0));
        assert_eq!(info.sitemaps, vec![format!("{}/sitemap.xml", server.uri())]);

        assert_eq!(
            gate.crawl_delay(&server.uri()).await,
            Some(Duration::from_secs(3))
        );

        let policy = gate.policy(&server.uri()).await;
        assert_eq!(policy.disallow, vec!["/members".to_string()]);
        assert!(policy.ttl_expiry > policy.fetched_at);
        assert_eq!(gate.robots_fetches(), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_refused() {
        let gate = gate(chrono::Duration::hours(24));
        let decision = gate.can_scrape("not a url").await;
        assert!(!decision.allowed);
        assert_eq!(gate.robots_fetches(), 0);
    }
}
