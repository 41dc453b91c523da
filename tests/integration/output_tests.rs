//! Batch output files produced from a real run

use crate::common::{fast_config, serve_page, site_with_robots, target, COURSE_PAGE};
use fairway_scout::output::{
    format_markdown_summary, generate_markdown_summary, write_results, BatchSummary,
};
use fairway_scout::{ProcessingResult, RequestOrchestrator, ScrapeOptions, ScrapeTarget};
use tempfile::TempDir;

#[tokio::test]
async fn test_results_and_summary_written() {
    let server = site_with_robots("User-agent: *\nDisallow: /members").await;
    serve_page(&server, "/course", COURSE_PAGE).await;

    let orchestrator = RequestOrchestrator::new(&fast_config()).unwrap();
    let started_at = chrono::Utc::now();
    let targets = vec![
        target(&server, "public", "/course"),
        target(&server, "members", "/members/course"),
    ];
    let results = orchestrator
        .add_batch(targets.clone(), ScrapeOptions::default())
        .await;

    let outcomes: Vec<(ScrapeTarget, ProcessingResult)> = targets
        .into_iter()
        .zip(results.into_iter().map(|r| r.unwrap()))
        .collect();

    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("results.jsonl");
    write_results(&outcomes, &results_path).unwrap();

    let content = std::fs::read_to_string(&results_path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["targetId"], "public");
    assert_eq!(lines[0]["success"], true);
    assert_eq!(lines[0]["data"]["parScore"], 72);
    assert_eq!(lines[1]["targetId"], "members");
    assert_eq!(lines[1]["errors"][0]["type"], "robots-disallowed");

    let summary = BatchSummary::from_results(
        &outcomes,
        orchestrator.get_stats(),
        orchestrator.get_health_status(),
        "deadbeef",
        started_at,
    );
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);

    let markdown = format_markdown_summary(&summary);
    assert!(markdown.contains("| ROBOTS_DISALLOWED | 1 |"));
    assert!(markdown.contains("- **Blocked by robots.txt**: 1"));

    let summary_path = dir.path().join("summary.md");
    generate_markdown_summary(&summary, &summary_path).unwrap();
    assert!(summary_path.exists());

    orchestrator.cleanup().await.unwrap();
}
