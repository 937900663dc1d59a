//! Row sinks for scan output.
//!
//! A sink receives records in extraction order and never sees the whole
//! inventory at once. Rows already written stay written if the scan fails
//! later.

use crate::error::{BidscanError, Result};
use crate::types::{FileRecord, RECORD_COLUMNS};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Destination for scan records
pub trait RecordSink {
    /// Append one record.
    fn write_record(&mut self, record: &FileRecord) -> Result<()>;

    /// Flush anything buffered. Called once after the last record.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Delimited text output with a header row.
pub struct CsvRecordSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
    rows_written: u64,
}

impl<W: Write> CsvRecordSink<W> {
    /// Comma-separated output
    pub fn new(writer: W) -> Self {
        Self::with_delimiter(writer, b',')
    }

    /// Tab-separated output
    pub fn tsv(writer: W) -> Self {
        Self::with_delimiter(writer, b'\t')
    }

    pub fn with_delimiter(writer: W, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(writer);
        Self {
            writer,
            header_written: false,
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.ensure_header()?;
        self.writer
            .into_inner()
            .map_err(|e| BidscanError::Io(io::Error::new(e.error().kind(), e.error().to_string())))
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.header_written {
            self.writer.write_record(RECORD_COLUMNS)?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl CsvRecordSink<File> {
    /// Create (or truncate) an output file.
    pub fn create(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::create(path)?;
        info!(path = %path.display(), "Writing inventory");
        Ok(Self::with_delimiter(file, delimiter))
    }
}

impl<W: Write> RecordSink for CsvRecordSink<W> {
    fn write_record(&mut self, record: &FileRecord) -> Result<()> {
        self.ensure_header()?;
        self.writer.write_record(record.to_row())?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // An empty scan still gets a header.
        self.ensure_header()?;
        self.writer.flush()?;
        debug!(rows = self.rows_written, "Flushed inventory");
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<FileRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn write_record(&mut self, record: &FileRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
