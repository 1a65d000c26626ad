//! Output module for persisting records and reporting on a crawl
//!
//! This module handles:
//! - The `Sink` boundary the coordinator flushes to after every page
//! - The CSV sink and its reader
//! - The end-of-run crawl report

mod csv_sink;
pub mod stats;
mod traits;

pub use csv_sink::{read_records, CsvSink, CSV_HEADER};
pub use stats::{print_report, CrawlReport, Termination, EXIT_EMPTY_ITEM_QUERY};
pub use traits::{Sink, SinkError, SinkResult};
