//! Markdown summary generation
//!
//! This module generates a human-readable summary of a batch run, including
//! outcome counts, error breakdowns and low-confidence extractions.

use crate::model::{ProcessingResult, ScrapeTarget};
use crate::orchestrator::{HealthStatus, OrchestratorStats};
use crate::output::OutputResult;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Successful extractions below this confidence are listed for review
const LOW_CONFIDENCE: u8 = 40;

/// A failed target as listed in the summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureLine {
    pub target_id: String,
    pub url: String,
    pub code: String,
    pub message: String,
    pub attempts: u32,
}

/// Everything the markdown summary reports
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
    pub total_targets: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub average_confidence: f64,
    /// Error code -> occurrences
    pub error_counts: BTreeMap<String, usize>,
    pub failures: Vec<FailureLine>,
    /// (target id, confidence) for weak extractions
    pub low_confidence: Vec<(String, u8)>,
    pub stats: OrchestratorStats,
    pub health: HealthStatus,
}

impl BatchSummary {
    /// Builds a summary from a finished batch
    pub fn from_results(
        outcomes: &[(ScrapeTarget, ProcessingResult)],
        stats: OrchestratorStats,
        health: HealthStatus,
        config_hash: &str,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut error_counts = BTreeMap::new();
        let mut failures = Vec::new();
        let mut low_confidence = Vec::new();
        let mut confidence_sum = 0u64;
        let mut succeeded = 0;

        for (target, result) in outcomes {
            if result.success {
                succeeded += 1;
                confidence_sum += u64::from(result.confidence);
                if result.confidence < LOW_CONFIDENCE {
                    low_confidence.push((target.id.clone(), result.confidence));
                }
                continue;
            }

            for error in &result.errors {
                *error_counts.entry(error.code.clone()).or_insert(0) += 1;
            }
            if let Some(error) = result.primary_error() {
                failures.push(FailureLine {
                    target_id: target.id.clone(),
                    url: target.url.clone(),
                    code: error.code.clone(),
                    message: error.message.clone(),
                    attempts: result.attempts,
                });
            }
        }

        Self {
            started_at,
            finished_at: Utc::now(),
            config_hash: config_hash.to_string(),
            total_targets: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            average_confidence: if succeeded == 0 {
                0.0
            } else {
                confidence_sum as f64 / succeeded as f64
            },
            error_counts,
            failures,
            low_confidence,
            stats,
            health,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_targets == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.total_targets as f64) * 100.0
    }
}

/// Writes the batch summary as markdown
///
/// # Arguments
///
/// * `summary` - The batch summary data
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(summary: &BatchSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a batch summary as markdown
pub fn format_markdown_summary(summary: &BatchSummary) -> String {
    let mut md = String::new();

    md.push_str("# Fairway Scout Batch Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    let duration = (summary.finished_at - summary.started_at).num_seconds().max(0);
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    md.push_str(&format!("- **Config Hash**: {}\n", summary.config_hash));
    md.push_str(&format!(
        "- **Health**: {:?}\n\n",
        summary.health.status
    ));

    md.push_str("## Results\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Targets | {} |\n", summary.total_targets));
    md.push_str(&format!("| Succeeded | {} |\n", summary.succeeded));
    md.push_str(&format!("| Failed | {} |\n\n", summary.failed));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!(
        "- **Average Confidence**: {:.1}\n\n",
        summary.average_confidence
    ));

    let stats = &summary.stats;
    md.push_str("## Fetching\n\n");
    md.push_str(&format!("- **Attempts**: {}\n", stats.attempts));
    md.push_str(&format!("- **Retries**: {}\n", stats.retries));
    md.push_str(&format!("- **Timeouts**: {}\n", stats.timeouts));
    md.push_str(&format!("- **Blocked by robots.txt**: {}\n", stats.robots_blocked));
    md.push_str(&format!(
        "- **Static / Dynamic fetches**: {} / {}\n",
        stats.static_fetches, stats.dynamic_fetches
    ));
    md.push_str(&format!("- **Escalations**: {}\n", stats.escalations));
    md.push_str(&format!(
        "- **Average Response Time**: {:.0}ms\n\n",
        stats.average_response_time_ms
    ));

    if !summary.error_counts.is_empty() {
        md.push_str("## Error Summary\n\n");
        md.push_str("| Error Code | Count |\n");
        md.push_str("|------------|-------|\n");
        for (code, count) in &summary.error_counts {
            md.push_str(&format!("| {} | {} |\n", code, count));
        }
        md.push('\n');
    }

    if !summary.failures.is_empty() {
        md.push_str("## Failed Targets\n\n");
        md.push_str("| Target | URL | Code | Attempts | Message |\n");
        md.push_str("|--------|-----|------|----------|---------|\n");
        for failure in &summary.failures {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                failure.target_id,
                failure.url,
                failure.code,
                failure.attempts,
                failure.message.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    if !summary.low_confidence.is_empty() {
        md.push_str("## Low-Confidence Extractions\n\n");
        for (target_id, confidence) in &summary.low_confidence {
            md.push_str(&format!("- {} ({})\n", target_id, confidence));
        }
        md.push('\n');
    }

    if !stats.origins.is_empty() {
        md.push_str("## Origins\n\n");
        md.push_str("| Origin | Requests | Successes | Failures | Rate Limited |\n");
        md.push_str("|--------|----------|-----------|----------|--------------|\n");
        for (origin, o) in &stats.origins {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                origin, o.requests, o.successes, o.failures, o.rate_limited
            ));
        }
        md.push('\n');
    }

    if !summary.health.issues.is_empty() {
        md.push_str("## Health Issues\n\n");
        for issue in &summary.health.issues {
            md.push_str(&format!("- {}\n", issue));
        }
        md.push('\n');
    }

    md
}
