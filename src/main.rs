//! Sumi-Mirror main entry point
//!
//! This is the command-line interface for the Sumi-Mirror page snapshotter.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sumi_mirror::config::{
    config_fingerprint, load_url_list, read_config, validate, IdleStrategy, RunConfig,
};
use sumi_mirror::crawler::run_mirror;
use sumi_mirror::output::{RunReport, SitePersister};
use sumi_mirror::url::parse_target_url;
use tracing_subscriber::EnvFilter;

/// Sumi-Mirror: a static snapshotter for rendered web pages
///
/// Sumi-Mirror opens each URL in a headless browser, waits for the page to
/// go idle, and saves the rendered HTML into a directory tree that mirrors
/// the URL paths.
#[derive(Parser, Debug)]
#[command(name = "sumi-mirror")]
#[command(version = "1.0.0")]
#[command(about = "A static snapshotter for rendered web pages", long_about = None)]
struct Cli {
    /// URLs to mirror, after those from the config file and --urls-file
    #[arg(value_name = "URLS")]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// File with one URL per line (blank lines and # comments are skipped)
    #[arg(short = 'i', long, value_name = "FILE")]
    urls_file: Option<PathBuf>,

    /// Output directory for the mirrored HTML
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Navigation timeout per attempt, in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Maximum navigation attempts per URL
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Pause between navigation attempts, in milliseconds
    #[arg(long, value_name = "MS")]
    retry_interval: Option<u64>,

    /// Capture a full-page screenshot of every page
    #[arg(long)]
    screenshots: bool,

    /// Output directory for screenshots
    #[arg(long, value_name = "DIR")]
    screenshot_dir: Option<PathBuf>,

    /// How to decide that a page has finished loading
    #[arg(long, value_enum, value_name = "STRATEGY")]
    idle: Option<IdleStrategy>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Write a JSON report of the run to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Validate config and show where each URL would be saved without launching a browser
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => RunConfig::default(),
    };

    // Validated once, after command-line flags are merged in
    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    let fingerprint = config_fingerprint(&config)?;
    tracing::info!("Configuration ready (fingerprint: {})", fingerprint);

    let urls = collect_urls(&config, &cli)?;
    if urls.is_empty() {
        bail!("No URLs to mirror: pass them as arguments, with --urls-file, or in the config file");
    }

    if cli.dry_run {
        handle_dry_run(&config, &urls, &fingerprint);
        return Ok(());
    }

    handle_mirror(config, &urls, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_mirror=info,warn"),
            1 => EnvFilter::new("sumi_mirror=debug,info"),
            2 => EnvFilter::new("sumi_mirror=trace,debug"),
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

/// Layers command-line flags over the file configuration
fn apply_overrides(config: &mut RunConfig, cli: &Cli) {
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
    if cli.screenshots {
        config.output.screenshots = true;
    }
    if let Some(dir) = &cli.screenshot_dir {
        config.output.screenshot_directory = dir.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.navigation.timeout_ms = timeout;
    }
    if let Some(retries) = cli.retries {
        config.navigation.retries = retries;
    }
    if let Some(interval) = cli.retry_interval {
        config.navigation.retry_interval_ms = interval;
    }
    if let Some(strategy) = cli.idle {
        config.idle.strategy = strategy;
    }
    if cli.headed {
        config.browser.headless = false;
    }
}

/// Gathers URLs from the config file, the URL list file and the command line, in that order
fn collect_urls(config: &RunConfig, cli: &Cli) -> anyhow::Result<Vec<String>> {
    let mut urls = config.urls.clone();

    if let Some(path) = &cli.urls_file {
        let listed = load_url_list(path)
            .with_context(|| format!("Failed to read URL list from {}", path.display()))?;
        tracing::info!("Loaded {} URLs from {}", listed.len(), path.display());
        urls.extend(listed);
    }

    urls.extend(cli.urls.iter().cloned());
    Ok(urls)
}

/// Handles the --dry-run mode: shows the configuration and the planned layout
fn handle_dry_run(config: &RunConfig, urls: &[String], fingerprint: &str) {
    println!("=== Sumi-Mirror Dry Run ===\n");

    println!("Navigation:");
    println!("  Timeout: {}ms", config.navigation.timeout_ms);
    println!("  Attempts per URL: {}", config.navigation.retries);
    println!("  Retry interval: {}ms", config.navigation.retry_interval_ms);

    println!("\nIdle Detection:");
    println!("  Strategy: {:?}", config.idle.strategy);
    println!("  Max in-flight requests: {}", config.idle.max_inflight);
    println!("  Quiet window: {}ms", config.idle.quiet_window_ms);
    println!("  Settle wait: {}", config.idle.settle);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Window: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    if let Some(executable) = &config.browser.executable {
        println!("  Executable: {}", executable.display());
    }

    println!("\nOutput:");
    println!("  HTML: {}", config.output.directory.display());
    if config.output.screenshots {
        println!(
            "  Screenshots: {}",
            config.output.screenshot_directory.display()
        );
    }

    let persister = SitePersister::from_config(&config.output);
    let mut invalid = 0;

    println!("\nURLs ({}):", urls.len());
    for input in urls {
        match parse_target_url(input) {
            Ok(url) => {
                println!("  - {}", url);
                println!("    -> {}", persister.html_path(&url).display());
                if let Some(shot) = persister.screenshot_path(&url) {
                    println!("    -> {}", shot.display());
                }
            }
            Err(e) => {
                invalid += 1;
                println!("  - {} (skipped: {})", input, e);
            }
        }
    }

    println!("\n✓ Configuration is valid (fingerprint: {})", fingerprint);
    println!("✓ Would mirror {} URLs", urls.len() - invalid);
}

/// Handles the main mirror operation
async fn handle_mirror(config: RunConfig, urls: &[String], cli: &Cli) -> anyhow::Result<()> {
    tracing::info!(
        "Starting mirror of {} URLs (timeout {}ms, {} attempts each)",
        urls.len(),
        config.navigation.timeout_ms,
        config.navigation.retries
    );

    match run_mirror(config, urls).await {
        Ok(report) => emit_report(&report, cli),
        Err(aborted) => {
            tracing::error!("Mirror failed: {}", aborted.error);
            emit_report(&aborted.report, cli)?;
            Err(aborted.error.into())
        }
    }
}

/// Writes the JSON report when requested and prints the summary unless quiet
fn emit_report(report: &RunReport, cli: &Cli) -> anyhow::Result<()> {
    if let Some(path) = &cli.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    if !cli.quiet {
        println!();
        report.print_summary();
    }

    Ok(())
}
