//! Sink trait and error types
//!
//! A sink receives the complete record collection after every visited page
//! and replaces whatever it held before. Flushing the same collection twice
//! leaves the same content behind.

use crate::crawler::Record;
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Persistence boundary for the growing record collection
pub trait Sink {
    /// Replaces the persisted content with `records`
    ///
    /// A failed flush must not damage content written by an earlier
    /// successful flush.
    fn flush(&mut self, records: &[Record]) -> SinkResult<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn flush(&mut self, records: &[Record]) -> SinkResult<()> {
        (**self).flush(records)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn flush(&mut self, records: &[Record]) -> SinkResult<()> {
        (**self).flush(records)
    }
}
