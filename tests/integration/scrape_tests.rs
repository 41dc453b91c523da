//! End-to-end scrapes through the orchestrator and the static extractor

use crate::common::{
    fast_config, serve_page, site_with_robots, target, test_config, COURSE_PAGE,
};
use fairway_scout::model::{FetchMethod, Priority};
use fairway_scout::{ErrorType, RequestOrchestrator, ScrapeOptions};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_course_page_extracted() {
    let server = site_with_robots("User-agent: *\nAllow: /").await;
    serve_page(&server, "/course", COURSE_PAGE).await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let result = orchestrator
        .add_request(target(&server, "test", "/course"), ScrapeOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.errors.is_empty());
    assert_eq!(result.method(), FetchMethod::Static);
    assert_eq!(result.attempts, 1);

    let facts = result.data.as_ref().unwrap();
    assert_eq!(facts.name, "Test Golf Course");
    assert_eq!(facts.architect.as_deref(), Some("Tom Fazio"));
    assert_eq!(facts.opening_year, Some(1995));
    assert_eq!(facts.par_score, Some(72));
    assert_eq!(facts.total_yardage, Some(7200));
    assert_eq!(facts.number_of_holes, 18);
    assert_eq!(facts.confidence, result.confidence);

    let contact = result.contact.as_ref().unwrap();
    assert_eq!(contact.phone.as_deref(), Some("+15555550123"));
    assert_eq!(contact.email.as_deref(), Some("proshop@testgolf.example"));

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_malformed_html_still_succeeds() {
    let server = site_with_robots("").await;
    serve_page(
        &server,
        "/broken",
        "<html><body><div class='x'><p>Welcome to the <b>club",
    )
    .await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let result = orchestrator
        .add_request(target(&server, "broken", "/broken"), ScrapeOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    let facts = result.data.unwrap();
    assert_eq!(facts.name, "Fallback Links");
    assert!(facts.confidence > 0);

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_images_resolved_and_bucketed() {
    let server = site_with_robots("").await;
    serve_page(
        &server,
        "/photos",
        r#"<html><body>
            <h1>Pine Links</h1>
            <div class="hero"><img src="/img/hero.jpg"></div>
            <div class="gallery">
                <img src="img/one.jpg">
                <img data-src="/img/two.jpg">
            </div>
        </body></html>"#,
    )
    .await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let result = orchestrator
        .add_request(target(&server, "photos", "/photos"), ScrapeOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    let images = result.images.unwrap();
    assert_eq!(images.hero, vec![format!("{}/img/hero.jpg", server.uri())]);
    assert_eq!(
        images.gallery,
        vec![
            format!("{}/img/one.jpg", server.uri()),
            format!("{}/img/two.jpg", server.uri()),
        ]
    );
    assert!(images.course_map.is_empty());

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_not_found_fails_without_retry() {
    let server = site_with_robots("").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let result = orchestrator
        .add_request(target(&server, "gone", "/gone"), ScrapeOptions::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.data.is_none());
    assert_eq!(result.confidence, 0);
    assert_eq!(result.attempts, 1);
    let error = result.primary_error().unwrap();
    assert_eq!(error.code, "HTTP_404");
    assert_eq!(error.status_code, Some(404));
    assert!(!error.retryable);

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_server_error_retried_then_succeeds() {
    let server = site_with_robots("").await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    serve_page(&server, "/flaky", COURSE_PAGE).await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let result = orchestrator
        .add_request(target(&server, "flaky", "/flaky"), ScrapeOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.attempts, 2);
    assert_eq!(orchestrator.get_stats().retries, 1);

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_rate_limited_exhausts_attempts() {
    let server = site_with_robots("").await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let result = orchestrator
        .add_request(target(&server, "busy", "/busy"), ScrapeOptions::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.attempts, 3);
    assert_eq!(result.primary_error().unwrap().kind, ErrorType::RateLimited);

    let stats = orchestrator.get_stats();
    let rate_limited: u64 = stats.origins.values().map(|o| o.rate_limited).sum();
    assert_eq!(rate_limited, 3);
    assert_eq!(stats.retries, 2);

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_timeout_reported() {
    let server = site_with_robots("").await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(COURSE_PAGE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = test_config(
        "default-crawl-delay-ms = 0\nrequest-timeout-ms = 200\nmax-attempts = 1",
    );
    let orchestrator = RequestOrchestrator::new(&config).unwrap();

    let started = Instant::now();
    let result = orchestrator
        .add_request(target(&server, "slow", "/slow"), ScrapeOptions::default())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!result.success);
    let error = result.primary_error().unwrap();
    assert_eq!(error.code, "TIMEOUT");
    assert!(error.retryable);
    assert_eq!(orchestrator.get_stats().timeouts, 1);

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_same_origin_requests_are_spaced() {
    let server = site_with_robots("").await;
    serve_page(&server, "/a", COURSE_PAGE).await;
    serve_page(&server, "/b", COURSE_PAGE).await;

    let config = test_config("default-crawl-delay-ms = 300\nmax-concurrent-requests = 2");
    let orchestrator = RequestOrchestrator::new(&config).unwrap();

    let started = Instant::now();
    let results = orchestrator
        .add_batch(
            vec![target(&server, "a", "/a"), target(&server, "b", "/b")],
            ScrapeOptions::default(),
        )
        .await;

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(results.iter().all(|r| r.as_ref().unwrap().success));

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_batch_results_in_input_order() {
    let server = site_with_robots("").await;
    serve_page(&server, "/one", "<h1>One Links</h1>").await;
    serve_page(&server, "/two", "<h1>Two Links</h1>").await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let results = orchestrator
        .add_batch(
            vec![
                target(&server, "one", "/one").with_priority(Priority::Low),
                target(&server, "two", "/two").with_priority(Priority::High),
            ],
            ScrapeOptions::default(),
        )
        .await;

    let names: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap().data.unwrap().name)
        .collect();
    assert_eq!(names, vec!["One Links", "Two Links"]);

    let stats = orchestrator.get_stats();
    assert_eq!(stats.submitted, 2);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.in_flight, 0);

    orchestrator.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_requests_refused_after_cleanup() {
    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    orchestrator.cleanup().await.unwrap();
    orchestrator.cleanup().await.unwrap();

    let target = fairway_scout::ScrapeTarget::new("late", "Late Links", "http://127.0.0.1:1/");
    let outcome = orchestrator
        .add_request(target, ScrapeOptions::default())
        .await;
    assert!(matches!(outcome, Err(fairway_scout::FairwayError::ShutDown)));
}
