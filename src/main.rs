//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest listing crawler.

use anyhow::Context;
use clap::Parser;
use page_harvest::config::{parse_config_with_hash, validate, Config};
use page_harvest::crawler::run_crawl;
use page_harvest::output::{print_report, read_records};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: a bounded, pagination-aware listing crawler
///
/// Page-Harvest starts from one listing page, follows its page-number links
/// breadth-first up to a page budget, and rewrites every product it finds to
/// a CSV file after each page.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version)]
#[command(about = "A bounded, pagination-aware listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Maximum number of pages to visit (overrides the config file)
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// CSV output path (overrides the config file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the existing CSV output and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = load_effective_config(&cli)?;

    if cli.stats {
        handle_stats(&config)?;
        return Ok(0);
    }

    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(0);
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
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

/// Reads the config file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = parse_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(seed) = &cli.seed {
        config.crawler.seed = Some(seed.clone());
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.clone();
    }

    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Page-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.crawler.seed.as_deref().unwrap_or("-"));
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!("  Connect timeout: {}ms", config.crawler.connect_timeout_ms);
    println!("  Delay between pages: {}ms", config.crawler.page_delay_ms);
    println!("  Same host only: {}", config.crawler.same_host_only);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nSelectors:");
    println!("  Item: {}", config.selectors.item);
    for (field, selector) in [
        ("url", &config.selectors.link),
        ("image", &config.selectors.image),
        ("name", &config.selectors.name),
        ("price", &config.selectors.price),
    ] {
        match &selector.attr {
            Some(attr) => println!("  {}: {} @{}", field, selector.selector, attr),
            None => println!("  {}: {} (text)", field, selector.selector),
        }
    }
    println!(
        "  Pagination: {} @{}",
        config.selectors.pagination, config.selectors.pagination_attr
    );

    println!("\nLinks:");
    println!("  Strip fragment: {}", config.links.strip_fragment);
    println!("  Strip trailing slash: {}", config.links.strip_trailing_slash);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes an existing CSV output
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.csv_path);
    let records = read_records(path).with_context(|| format!("failed to read {}", path.display()))?;

    let mut pages: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    pages.sort_unstable();
    pages.dedup();

    println!("=== Output Statistics ===\n");
    println!("File: {}", path.display());
    println!("  Records: {}", records.len());
    println!("  Distinct product URLs: {}", pages.len());
    println!(
        "  Records with empty fields: {}",
        records
            .iter()
            .filter(|r| r.url.is_empty() || r.image.is_empty() || r.name.is_empty() || r.price.is_empty())
            .count()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> anyhow::Result<u8> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            let _ = shutdown_tx.send(true);
        }
    });

    let report = run_crawl(&config, Some(shutdown_rx))
        .await
        .context("crawl failed")?;

    if !quiet {
        print_report(&report);
    }

    if report.has_empty_item_pages() {
        tracing::warn!(
            "{} page(s) had no items matching `{}`",
            report.empty_item_pages.len(),
            config.selectors.item
        );
    }

    Ok(report.exit_code())
}
