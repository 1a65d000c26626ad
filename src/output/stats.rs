//! Crawl report
//!
//! Every skip the coordinator takes is counted here, so a caller can tell a
//! clean empty result apart from a run in which every page failed.

use chrono::{DateTime, Utc};
use std::fmt;

/// Exit status when at least one page's item query matched nothing
pub const EXIT_EMPTY_ITEM_QUERY: u8 = 2;

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No URL left to visit
    FrontierExhausted,

    /// The page budget was spent with URLs still pending
    BudgetExhausted,

    /// Shutdown was requested between or during iterations
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FrontierExhausted => "frontier exhausted",
            Self::BudgetExhausted => "page budget exhausted",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Pages taken from the frontier
    pub pages_visited: u32,

    /// Records in the final collection
    pub records: usize,

    /// URLs ever discovered, seed included
    pub urls_discovered: usize,

    /// URLs still pending when the crawl stopped
    pub urls_pending: usize,

    /// Pages skipped because the fetch failed
    pub fetch_failures: u32,

    /// Pages skipped because no document could be built
    pub malformed_pages: u32,

    /// Pages whose item query matched no node
    pub empty_item_pages: Vec<String>,

    /// Items skipped because a field was missing
    pub missing_field_items: u32,

    /// Flushes the sink rejected
    pub sink_failures: u32,

    /// Pagination links dropped for pointing at another site
    pub offsite_links: u32,

    pub termination: Option<Termination>,
}

impl CrawlReport {
    /// Creates an empty report stamped with the current time
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_visited: 0,
            records: 0,
            urls_discovered: 0,
            urls_pending: 0,
            fetch_failures: 0,
            malformed_pages: 0,
            empty_item_pages: Vec::new(),
            missing_field_items: 0,
            sink_failures: 0,
            offsite_links: 0,
            termination: None,
        }
    }

    /// Returns true if any page had an empty item query
    pub fn has_empty_item_pages(&self) -> bool {
        !self.empty_item_pages.is_empty()
    }

    /// Returns the total number of skipped pages
    pub fn skipped_pages(&self) -> u32 {
        self.fetch_failures + self.malformed_pages
    }

    /// Process exit status for this run
    ///
    /// `EXIT_EMPTY_ITEM_QUERY` when any page's item query came back empty,
    /// 0 otherwise. Partial data is kept either way.
    pub fn exit_code(&self) -> u8 {
        if self.has_empty_item_pages() {
            EXIT_EMPTY_ITEM_QUERY
        } else {
            0
        }
    }

    /// Duration of the run in seconds, once finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    if let Some(seconds) = report.duration_seconds() {
        println!("  Duration: {:.1}s", seconds);
    }
    if let Some(termination) = report.termination {
        println!("  Stopped: {}", termination);
    }
    println!("  Pages visited: {}", report.pages_visited);
    println!("  URLs discovered: {}", report.urls_discovered);
    println!("  URLs still pending: {}", report.urls_pending);
    println!("  Records collected: {}", report.records);
    println!();

    println!("Skips:");
    println!("  Pages skipped: {}", report.skipped_pages());
    println!("  Fetch failures: {}", report.fetch_failures);
    println!("  Malformed pages: {}", report.malformed_pages);
    println!("  Items missing a field: {}", report.missing_field_items);
    println!("  Sink failures: {}", report.sink_failures);
    println!("  Off-site links dropped: {}", report.offsite_links);

    if report.has_empty_item_pages() {
        println!();
        println!(
            "Pages with no items ({}):",
            report.empty_item_pages.len()
        );
        for url in &report.empty_item_pages {
            println!("  - {}", url);
        }
    }
}
