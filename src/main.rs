//! Fairway Scout main entry point
//!
//! This is the command-line interface for the Fairway Scout course scraper.

use chrono::Utc;
use clap::Parser;
use fairway_scout::config::{load_config_with_hash, Config};
use fairway_scout::output::{
    generate_markdown_summary, print_statistics, write_results, write_screenshots, BatchSummary,
};
use fairway_scout::renderer::{NoopRenderer, Renderer};
use fairway_scout::{PolicyGate, ProcessingResult, RequestOrchestrator, ScrapeOptions, ScrapeTarget};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Fairway Scout: a polite golf-course fact harvester
///
/// Fairway Scout fetches the course pages listed in a TOML file while
/// respecting robots.txt and per-origin pacing, extracts course facts,
/// contact details and imagery, and writes results as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "fairway")]
#[command(version)]
#[command(about = "A polite golf-course fact harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the targets without fetching anything
    #[arg(long, conflicts_with = "robots")]
    dry_run: bool,

    /// Show robots.txt rules for a URL and whether it may be scraped, then exit
    #[arg(long, value_name = "URL", conflicts_with = "dry_run")]
    robots: Option<String>,

    /// Only scrape targets with these ids
    #[arg(long, value_name = "ID", num_args = 1..)]
    only: Vec<String>,

    /// Render every target in the browser
    #[arg(long)]
    javascript: bool,

    /// Capture a screenshot of every rendered page
    #[arg(long)]
    screenshots: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli.only);
    } else if let Some(url) = &cli.robots {
        handle_robots(&config, url).await?;
    } else {
        let options = ScrapeOptions {
            javascript: cli.javascript,
            screenshots: cli.screenshots,
            ..ScrapeOptions::default()
        };
        handle_scrape(&config, &config_hash, &cli.only, options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fairway_scout=info,warn"),
            1 => EnvFilter::new("fairway_scout=debug,info"),
            2 => EnvFilter::new("fairway_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn selected_targets(config: &Config, only: &[String]) -> Vec<ScrapeTarget> {
    config
        .scrape_targets()
        .into_iter()
        .filter(|t| only.is_empty() || only.contains(&t.id))
        .collect()
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config, only: &[String]) {
    println!("=== Fairway Scout Dry Run ===\n");

    let scraper = &config.scraper;
    println!("Scraper Configuration:");
    println!("  Workers: {}", scraper.max_concurrent_requests);
    println!("  Queue limit: {}", scraper.queue_limit);
    println!("  Request timeout: {}ms", scraper.request_timeout_ms);
    println!(
        "  Crawl delay: {}ms (max {}ms)",
        scraper.default_crawl_delay_ms, scraper.max_crawl_delay_ms
    );
    println!(
        "  Attempts: {} (backoff base {}ms)",
        scraper.max_attempts, scraper.backoff_base_ms
    );
    println!(
        "  Dynamic confidence threshold: {}",
        scraper.dynamic_confidence_threshold
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());
    println!("  robots.txt token: {}", config.user_agent.robots_token());

    println!("\nBrowser:");
    println!("  Enabled: {}", config.browser.enabled);
    println!("  Screenshots: {}", config.browser.screenshots);

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  Screenshots: {}", config.output.screenshot_dir);

    let targets = selected_targets(config, only);
    println!("\nTargets ({}):", targets.len());
    for target in &targets {
        println!(
            "  - {} [{:?}, {:?}] {}",
            target.id, target.priority, target.source_type, target.url
        );
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would scrape {} targets", targets.len());
}

/// Handles the --robots mode: robots.txt diagnostics for one URL
async fn handle_robots(config: &Config, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = url::Url::parse(url)?;
    let origin = parsed.origin().ascii_serialization();
    let gate = PolicyGate::from_config(config)?;

    let info = gate.get_robots_info(&origin).await;
    let decision = gate.can_scrape(url).await;

    println!("=== robots.txt for {} ===\n", origin);
    println!("  Exists: {}", info.exists);
    println!("  Checked: {}", info.last_checked.to_rfc3339());
    match info.crawl_delay {
        Some(delay) => println!("  Crawl delay: {}s", delay),
        None => println!("  Crawl delay: none"),
    }
    if !info.sitemaps.is_empty() {
        println!("  Sitemaps:");
        for sitemap in &info.sitemaps {
            println!("    * {}", sitemap);
        }
    }

    println!();
    if decision.allowed {
        println!("✓ {} may be scraped as {}", url, gate.product_token());
    } else {
        println!(
            "✗ {} is disallowed: {}",
            url,
            decision.reason.unwrap_or_default()
        );
    }

    Ok(())
}

/// Handles the main scrape run
async fn handle_scrape(
    config: &Config,
    config_hash: &str,
    only: &[String],
    options: ScrapeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let started_at = Utc::now();
    let targets = selected_targets(config, only);
    if targets.is_empty() {
        tracing::warn!("No targets selected; nothing to do");
        return Ok(());
    }
    tracing::info!("Scraping {} targets", targets.len());

    let renderer = launch_renderer(config).await;
    let orchestrator = RequestOrchestrator::with_renderer(config, renderer)?;

    let results = orchestrator.add_batch(targets.clone(), options).await;

    let mut outcomes: Vec<(ScrapeTarget, ProcessingResult)> = Vec::with_capacity(targets.len());
    for (mut target, result) in targets.into_iter().zip(results) {
        match result {
            Ok(result) => {
                target.record_outcome(&result);
                outcomes.push((target, result));
            }
            Err(e) => tracing::error!(target_id = %target.id, "No result: {}", e),
        }
    }

    let stats = orchestrator.get_stats();
    let health = orchestrator.get_health_status();

    write_results(&outcomes, Path::new(&config.output.results_path))?;
    println!("✓ Results written to: {}", config.output.results_path);

    let shots = write_screenshots(&outcomes, Path::new(&config.output.screenshot_dir))?;
    if !shots.is_empty() {
        println!(
            "✓ {} screenshots saved to: {}",
            shots.len(),
            config.output.screenshot_dir
        );
    }

    let summary =
        BatchSummary::from_results(&outcomes, stats.clone(), health.clone(), config_hash, started_at);
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;
    println!("✓ Summary written to: {}\n", config.output.summary_path);

    print_statistics(&stats, &health);

    if let Err(e) = orchestrator.cleanup().await {
        tracing::warn!("Cleanup failed: {}", e);
    }

    Ok(())
}

#[cfg(feature = "chromium")]
async fn launch_renderer(config: &Config) -> Arc<dyn Renderer> {
    use fairway_scout::renderer::chromium::ChromiumRenderer;

    if !config.browser.enabled {
        return Arc::new(NoopRenderer);
    }
    match ChromiumRenderer::launch(&config.browser).await {
        Ok(renderer) => Arc::new(renderer),
        Err(e) => {
            tracing::warn!("Browser unavailable, fetching without JavaScript: {:#}", e);
            Arc::new(NoopRenderer)
        }
    }
}

#[cfg(not(feature = "chromium"))]
async fn launch_renderer(config: &Config) -> Arc<dyn Renderer> {
    if config.browser.enabled {
        tracing::warn!("Built without the chromium feature; fetching without JavaScript");
    }
    Arc::new(NoopRenderer)
}
