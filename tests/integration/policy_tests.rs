//! robots.txt enforcement against live mock sites

use crate::common::{fast_config, serve_page, site_with_robots, target, COURSE_PAGE};
use fairway_scout::{ErrorType, PolicyGate, RequestOrchestrator, ScrapeOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_disallowed_page_never_fetched() {
    let server = site_with_robots("User-agent: *\nDisallow: /private").await;
    Mock::given(method("GET"))
        .and(path("/private/course"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COURSE_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let result = orchestrator
        .add_request(
            target(&server, "private", "/private/course"),
            ScrapeOptions::default(),
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.attempts, 1);
    let error = result.primary_error().unwrap();
    assert_eq!(error.kind, ErrorType::RobotsDisallowed);
    assert!(!error.retryable);
    assert_eq!(orchestrator.get_stats().robots_blocked, 1);

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_group_for_our_agent_applies() {
    let server = site_with_robots(
        "User-agent: FairwayTest\nDisallow: /\n\nUser-agent: *\nAllow: /",
    )
    .await;
    serve_page(&server, "/course", COURSE_PAGE).await;

    let gate = PolicyGate::from_config(&fast_config()).unwrap();
    let decision = gate.can_scrape(&format!("{}/course", server.uri())).await;

    assert!(!decision.allowed);
    assert!(decision.reason.unwrap().contains("FairwayTest"));
}

#[tokio::test]
async fn test_robots_fetched_once_per_origin() {
    let server = site_with_robots("User-agent: *\nAllow: /").await;
    serve_page(&server, "/a", COURSE_PAGE).await;
    serve_page(&server, "/b", COURSE_PAGE).await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let results = orchestrator
        .add_batch(
            vec![target(&server, "a", "/a"), target(&server, "b", "/b")],
            ScrapeOptions::default(),
        )
        .await;

    assert!(results.iter().all(|r| r.as_ref().unwrap().success));
    assert_eq!(orchestrator.policy_gate().robots_fetches(), 1);

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = wiremock::MockServer::start().await;
    serve_page(&server, "/course", COURSE_PAGE).await;

    let gate = PolicyGate::from_config(&fast_config()).unwrap();
    let decision = gate.can_scrape(&format!("{}/course", server.uri())).await;
    let info = gate.get_robots_info(&server.uri()).await;

    assert!(decision.allowed);
    assert!(decision.reason.is_none());
    assert!(!info.exists);
    assert!(info.crawl_delay.is_none());
}

#[tokio::test]
async fn test_robots_info_reports_delay_and_sitemaps() {
    let server = site_with_robots(
        "User-agent: *\nCrawl-delay: 2\nDisallow: /admin\n\nSitemap: https://example.com/sitemap.xml",
    )
    .await;

    let gate = PolicyGate::from_config(&fast_config()).unwrap();
    let info = gate.get_robots_info(&server.uri()).await;

    assert!(info.exists);
    assert_eq!(info.crawl_delay, Some(2.0));
    assert_eq!(info.sitemaps, vec!["https://example.com/sitemap.xml"]);
}
