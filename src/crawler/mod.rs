//! Crawler module for listing page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier of discovered and pending URLs
//! - HTTP fetching with timeouts
//! - HTML parsing and pagination discovery
//! - Record extraction from item nodes
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{extract_record, ExtractError, Record, RecordField, Selectors};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, HttpFetcher};
pub use frontier::Frontier;
pub use parser::{discover_pagination, parse_document, DocumentError};

