//! bidscan - imaging dataset inventory
//!
//! Walks a dataset laid out as `sub-<id>/ses-<label>/<modality>/<file>` and
//! produces one row per data file, paired with the JSON sidecar that
//! describes it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ TreeWalker  │────▶│  Extractor  │────▶│ RecordSink  │
//! │ (one file   │     │ (path →     │     │ (CSV / TSV, │
//! │  at a time) │     │  record)    │     │  memory)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! [`Scanner`] ties the three together and owns the per-scan counters and
//! diagnostics.

pub mod config;
pub mod error;
pub mod extractor;
pub mod scan_path;
pub mod scanner;
pub mod sink;
pub mod types;
pub mod walker;

// Re-exports for convenience
pub use config::ScanConfig;
pub use error::{BidscanError, MalformedKind, MalformedPathError, Result, ScanPathError};
pub use extractor::{parse_path, parse_path_checked, Extraction, Extractor, SkipReason};
pub use scanner::Scanner;
pub use sink::{CsvRecordSink, MemorySink, RecordSink};
pub use types::{
    Diagnostic, FileRecord, PathRecord, ScanCounters, ScanProgress, ScanReport, Sidecar,
};
pub use walker::{DirectoryEntry, TreeWalker, Walk, WalkEvent};
