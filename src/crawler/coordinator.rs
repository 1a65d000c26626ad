//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the frontier, fetcher,
//! parser, extractor and sink together. One page is fully processed before
//! the next one is taken:
//!
//! `Ready → Fetching → Parsing → Extracting → Discovering → Persisting → Ready`
//!
//! A failed fetch or an unusable document returns straight to `Ready`. A page
//! whose item query matches nothing is recorded in the report but still goes
//! through discovery, so pagination is followed past it. The loop only ends
//! in `Done`, via an exhausted frontier, a spent page budget or cancellation.

use crate::config::{Config, LinkConfig};
use crate::crawler::extractor::{extract_record, Record, Selectors};
use crate::crawler::fetcher::{FetchResult, Fetcher, HttpFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{discover_pagination, parse_document};
use crate::output::{CrawlReport, CsvSink, Sink, Termination};
use crate::state::CrawlPhase;
use crate::url::{normalize_url, resolve_link, same_host};
use crate::{ConfigError, HarvestError, UrlError};
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator<F, S> {
    fetcher: F,
    sink: S,
    selectors: Selectors,
    links: LinkConfig,
    frontier: Frontier,
    records: Vec<Record>,
    seed: String,
    max_pages: u32,
    fetch_timeout: Duration,
    page_delay: Duration,
    same_host_only: bool,
    phase: CrawlPhase,
    report: CrawlReport,
    unflushed: bool,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<F: Fetcher, S: Sink> Coordinator<F, S> {
    /// Creates a new coordinator instance
    ///
    /// The seed is normalized with the configured link policy and placed in
    /// the frontier. Selectors are compiled here, so an invalid selector is
    /// reported before any request is made.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Turns URLs into document bytes
    /// * `sink` - Receives the record collection after every page
    pub fn new(config: &Config, fetcher: F, sink: S) -> Result<Self, HarvestError> {
        let seed = config.crawler.seed.as_deref().ok_or_else(|| {
            ConfigError::Validation("a seed URL is required (config or --seed)".to_string())
        })?;
        let seed = normalize_url(seed, &config.links)?;
        let selectors = Selectors::compile(&config.selectors)?;

        Ok(Self {
            fetcher,
            sink,
            selectors,
            links: config.links,
            frontier: Frontier::new(seed.clone()),
            records: Vec::new(),
            seed,
            max_pages: config.crawler.max_pages,
            fetch_timeout: Duration::from_millis(config.crawler.request_timeout_ms),
            page_delay: Duration::from_millis(config.crawler.page_delay_ms),
            same_host_only: config.crawler.same_host_only,
            phase: CrawlPhase::Ready,
            report: CrawlReport::new(),
            unflushed: false,
            shutdown: None,
        })
    }

    /// Stops the crawl once `true` is sent on this channel
    ///
    /// Cancellation is checked between pages and while waiting on a fetch.
    /// The sink keeps the content of the last completed page.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Runs the crawl loop until the frontier is exhausted, the page budget
    /// is spent, or shutdown is requested
    ///
    /// Per-page failures are counted in the returned report and never end
    /// the crawl. An `Err` means an internal invariant was broken.
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        if self.phase.is_terminal() {
            return Ok(self.report.clone());
        }

        tracing::info!(
            "Starting crawl at {} (budget: {} pages)",
            self.seed,
            self.max_pages
        );

        loop {
            if self.is_cancelled() {
                return self.finish(Termination::Cancelled);
            }

            if self.frontier.is_exhausted() {
                tracing::info!("Frontier is empty, crawl complete");
                return self.finish(Termination::FrontierExhausted);
            }

            if self.report.pages_visited >= self.max_pages {
                tracing::info!(
                    "Page budget of {} reached with {} URLs pending",
                    self.max_pages,
                    self.frontier.pending_count()
                );
                return self.finish(Termination::BudgetExhausted);
            }

            if self.report.pages_visited > 0 && !self.page_delay.is_zero() {
                let delay = self.page_delay;
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = wait_for_shutdown(self.shutdown.as_mut()) => {
                        return self.finish(Termination::Cancelled);
                    }
                }
            }

            let url = match self.frontier.take_next() {
                Some(url) => url,
                None => return self.finish(Termination::FrontierExhausted),
            };

            self.transition(CrawlPhase::Fetching)?;
            self.report.pages_visited += 1;
            tracing::info!(
                "Page {}/{}: {}",
                self.report.pages_visited,
                self.max_pages,
                url
            );

            let fetched = tokio::select! {
                result = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&url)) => result,
                _ = wait_for_shutdown(self.shutdown.as_mut()) => {
                    tracing::warn!("Shutdown requested while fetching {}", url);
                    return self.finish(Termination::Cancelled);
                }
            };

            let (final_url, body) = match fetched {
                Ok(FetchResult::Success {
                    final_url,
                    status_code,
                    body,
                }) => {
                    tracing::debug!(
                        "Fetched {} (HTTP {}, {} bytes)",
                        final_url,
                        status_code,
                        body.len()
                    );
                    (final_url, body)
                }
                Ok(FetchResult::HttpError { status_code }) => {
                    tracing::warn!("Skipping {}: HTTP {}", url, status_code);
                    self.report.fetch_failures += 1;
                    self.transition(CrawlPhase::Ready)?;
                    continue;
                }
                Ok(FetchResult::NetworkError { error, timed_out }) => {
                    if timed_out {
                        tracing::warn!("Skipping {}: client timed out ({})", url, error);
                    } else {
                        tracing::warn!("Skipping {}: {}", url, error);
                    }
                    self.report.fetch_failures += 1;
                    self.transition(CrawlPhase::Ready)?;
                    continue;
                }
                Err(_) => {
                    tracing::warn!(
                        "Skipping {}: no response within {:?}",
                        url,
                        self.fetch_timeout
                    );
                    self.report.fetch_failures += 1;
                    self.transition(CrawlPhase::Ready)?;
                    continue;
                }
            };

            self.record_redirect(&url, &final_url);
            self.transition(CrawlPhase::Parsing)?;
            if !self.scan_page(&url, &final_url, &body)? {
                continue;
            }

            self.transition(CrawlPhase::Persisting)?;
            self.persist();
            self.transition(CrawlPhase::Ready)?;
        }
    }

    /// Parses one fetched page, extracts its records and feeds its
    /// pagination links to the frontier
    ///
    /// Returns false if the body could not be parsed; the phase is then
    /// back at `Ready`. The document never outlives this call.
    fn scan_page(&mut self, url: &str, final_url: &str, body: &[u8]) -> Result<bool, HarvestError> {
        let document = match parse_document(body) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                self.report.malformed_pages += 1;
                self.transition(CrawlPhase::Ready)?;
                return Ok(false);
            }
        };

        self.transition(CrawlPhase::Extracting)?;
        let items = self.selectors.items(&document);
        let mut extracted = 0;

        if items.is_empty() {
            tracing::warn!("Item query matched nothing on {}", url);
            self.report.empty_item_pages.push(url.to_string());
        }

        for (index, item) in items.into_iter().enumerate() {
            match extract_record(item, &self.selectors) {
                Ok(record) => {
                    self.records.push(record);
                    extracted += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping item {} on {}: {}", index + 1, url, e);
                    self.report.missing_field_items += 1;
                }
            }
        }

        self.transition(CrawlPhase::Discovering)?;
        let base = Url::parse(final_url)
            .or_else(|_| Url::parse(url))
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        let hrefs = discover_pagination(
            &document,
            self.selectors.pagination(),
            self.selectors.pagination_attr(),
        );
        let mut queued = 0;

        for href in &hrefs {
            let link = match resolve_link(href, &base, &self.links) {
                Ok(link) => link,
                Err(e) => {
                    tracing::debug!("Ignoring pagination href {:?}: {}", href, e);
                    continue;
                }
            };

            if self.same_host_only && !same_host(&link, &self.seed) {
                tracing::warn!("Dropping off-site pagination link {} on {}", link, url);
                self.report.offsite_links += 1;
                continue;
            }

            if self.frontier.offer(link.clone()) {
                tracing::debug!("Queued {}", link);
                queued += 1;
            }
        }

        tracing::info!(
            "{}: {} records, {} pagination links ({} new)",
            url,
            extracted,
            hrefs.len(),
            queued
        );

        Ok(true)
    }

    /// Marks the target of a redirect as visited so it is not fetched again
    /// under its own name
    fn record_redirect(&mut self, url: &str, final_url: &str) {
        if final_url == url {
            return;
        }
        match normalize_url(final_url, &self.links) {
            Ok(target) if target != url => {
                if self.frontier.mark_visited(&target) {
                    tracing::debug!("{} redirected to {}", url, target);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Redirect target {} not tracked: {}", final_url, e),
        }
    }

    /// Flushes the whole record collection to the sink
    fn persist(&mut self) {
        match self.sink.flush(&self.records) {
            Ok(()) => self.unflushed = false,
            Err(e) => {
                tracing::error!(
                    "Failed to persist {} records: {} (will retry with the full set)",
                    self.records.len(),
                    e
                );
                self.report.sink_failures += 1;
                self.unflushed = true;
            }
        }
    }

    fn finish(&mut self, termination: Termination) -> Result<CrawlReport, HarvestError> {
        self.transition(CrawlPhase::Done)?;

        if self.unflushed {
            tracing::info!("Retrying the failed flush before exiting");
            self.persist();
        }

        self.report.termination = Some(termination);
        self.report.records = self.records.len();
        self.report.urls_discovered = self.frontier.discovered_count();
        self.report.urls_pending = self.frontier.pending_count();
        self.report.finished_at = Some(chrono::Utc::now());

        tracing::info!(
            "Crawl finished ({}): {} pages visited, {} records",
            termination,
            self.report.pages_visited,
            self.records.len()
        );

        Ok(self.report.clone())
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    /// Records collected so far
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The frontier
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// The current phase
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// The sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &str {
        &self.seed
    }
}

/// Resolves once `true` has been sent; never resolves without a channel
async fn wait_for_shutdown(shutdown: Option<&mut watch::Receiver<bool>>) {
    let Some(rx) = shutdown else {
        return std::future::pending().await;
    };

    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            // Sender gone: nobody can ask for shutdown any more
            return std::future::pending().await;
        }
    }
}

/// Runs a crawl over HTTP, writing records to the configured CSV file
///
/// # Example
///
/// ```no_run
/// use page_harvest::config::load_config;
/// use page_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_crawl(&config, None).await?;
/// println!("{} records", report.records);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    shutdown: Option<watch::Receiver<bool>>,
) -> Result<CrawlReport, HarvestError> {
    let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
    let sink = CsvSink::new(&config.output.csv_path);
    tracing::info!("Writing records to {}", sink.path().display());

    let mut coordinator = Coordinator::new(config, fetcher, sink)?;
    if let Some(shutdown) = shutdown {
        coordinator = coordinator.with_shutdown(shutdown);
    }
    coordinator.run().await
}
