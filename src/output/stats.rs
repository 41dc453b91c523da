//! Console statistics
//!
//! Renders an [`OrchestratorStats`] snapshot and its health report as plain
//! text for the terminal.

use crate::orchestrator::{HealthStatus, OrchestratorStats};
use std::fmt::Write;

/// Formats statistics the way `print_statistics` shows them
pub fn format_statistics(stats: &OrchestratorStats, health: &HealthStatus) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Scrape Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Submitted: {}", stats.submitted);
    let _ = writeln!(out, "  Completed: {}", stats.completed);
    let _ = writeln!(out, "  Successful: {}", stats.successful);
    let _ = writeln!(out, "  Failed: {}", stats.failed);
    let _ = writeln!(out, "  In flight: {}", stats.in_flight);
    let _ = writeln!(out, "  Queued: {}", stats.queued);
    let _ = writeln!(out, "  Uptime: {}s", stats.uptime_secs);
    let _ = writeln!(out);

    let _ = writeln!(out, "Fetching:");
    let _ = writeln!(
        out,
        "  Attempts: {} ({} static, {} dynamic)",
        stats.attempts, stats.static_fetches, stats.dynamic_fetches
    );
    let _ = writeln!(out, "  Retries: {}", stats.retries);
    let _ = writeln!(out, "  Timeouts: {}", stats.timeouts);
    let _ = writeln!(out, "  Blocked by robots.txt: {}", stats.robots_blocked);
    let _ = writeln!(out, "  Escalations: {}", stats.escalations);
    let _ = writeln!(
        out,
        "  Average response time: {:.0}ms",
        stats.average_response_time_ms
    );
    let _ = writeln!(out);

    if !stats.origins.is_empty() {
        let _ = writeln!(out, "Origins ({}):", stats.origins.len());
        // Busiest origins first
        let mut origins: Vec<_> = stats.origins.iter().collect();
        origins.sort_by(|a, b| b.1.requests.cmp(&a.1.requests).then(a.0.cmp(b.0)));
        for (origin, o) in origins {
            let _ = write!(
                out,
                "  {}: {} requests, {} ok, {} failed",
                origin, o.requests, o.successes, o.failures
            );
            if o.rate_limited > 0 {
                let _ = write!(out, ", {} rate limited", o.rate_limited);
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Health: {:?} (success rate {:.1}% over {} results)",
        health.status,
        health.success_rate * 100.0,
        health.recent_results
    );
    for issue in &health.issues {
        let _ = writeln!(out, "  - {}", issue);
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &OrchestratorStats, health: &HealthStatus) {
    print!("{}", format_statistics(stats, health));
}
