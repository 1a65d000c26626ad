use crate::crawler::Record;
use crate::output::traits::{Sink, SinkError, SinkResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed header line of the output file
pub const CSV_HEADER: [&str; 4] = ["url", "image", "name", "price"];

/// Sink that rewrites a CSV file on every flush
///
/// Each flush writes the full collection to `<path>.tmp` and renames it over
/// `<path>`, so readers only ever see a complete file. Fields containing the
/// delimiter, quotes or line breaks are quoted.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    flushes: u64,
}

impl CsvSink {
    /// Creates a sink writing to `path`
    ///
    /// Nothing is written until the first flush.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flushes: 0,
        }
    }

    /// Returns the target path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of successful flushes
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_file(path: &Path, records: &[Record]) -> SinkResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;

        writer.write_record(CSV_HEADER)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Sink for CsvSink {
    fn flush(&mut self, records: &[Record]) -> SinkResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        if let Err(e) = Self::write_file(&temp, records) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        fs::rename(&temp, &self.path)?;

        self.flushes += 1;
        tracing::debug!(
            "Wrote {} records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Reads records back from a file written by [`CsvSink`]
pub fn read_records(path: &Path) -> SinkResult<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.iter().ne(CSV_HEADER.iter().copied()) {
        return Err(SinkError::Write(format!(
            "unexpected header in {}: {:?}",
            path.display(),
            headers
        )));
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
