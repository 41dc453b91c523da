//! Shared fixtures

use fairway_scout::config::{parse_config, Config};
use fairway_scout::ScrapeTarget;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a test configuration with the given `[scraper]` body
pub fn test_config(scraper: &str) -> Config {
    let toml = format!(
        r#"
[scraper]
{scraper}

[user-agent]
crawler-name = "FairwayTest"
crawler-version = "1.0"
contact-url = "https://example.com/bot"
contact-email = "bot@example.com"
"#
    );
    parse_config(&toml).expect("test config should parse")
}

/// Fast settings: no pacing, short backoff
pub fn fast_config() -> Config {
    test_config(
        "default-crawl-delay-ms = 0\nbackoff-base-ms = 10\nrequest-timeout-ms = 5000\nmax-concurrent-requests = 2",
    )
}

/// Starts a server whose robots.txt has the given body
pub async fn site_with_robots(robots: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(robots.to_string()))
        .mount(&server)
        .await;
    server
}

/// Serves `html` at `page`
pub async fn serve_page(server: &MockServer, page: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html.as_bytes().to_vec(), "text/html"),
        )
        .mount(server)
        .await;
}

pub fn target(server: &MockServer, id: &str, page: &str) -> ScrapeTarget {
    ScrapeTarget::new(id, "Fallback Links", format!("{}{}", server.uri(), page))
}

pub const COURSE_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Test Golf Course | Home</title></head>
<body>
  <h1>Test Golf Course</h1>
  <div class="description">
    <p>Designed by Tom Fazio. Opened in 1995, this par-72 layout stretches 7,200 yards
    across rolling hills.</p>
  </div>
  <div class="contact">
    <a href="tel:+15555550123">(555) 555-0123</a>
    <a href="mailto:proshop@testgolf.example">proshop@testgolf.example</a>
  </div>
</body></html>"#;
