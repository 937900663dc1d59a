//! Dataset scanner
//!
//! Drives one scan from start to finish:
//!
//! - validate the root
//! - walk it with [`TreeWalker`], one file at a time
//! - hand each file to the [`Extractor`]
//! - write records to a [`RecordSink`] in extraction order
//!
//! All counters live in a per-call context, so scans never share state.

use crate::config::ScanConfig;
use crate::error::Result;
use crate::extractor::{Extraction, Extractor};
use crate::scan_path::{relative_path, validate_scan_path};
use crate::sink::RecordSink;
use crate::types::{Diagnostic, FileRecord, ScanCounters, ScanProgress, ScanReport};
use crate::walker::{TreeWalker, WalkEvent};
use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Mutable state for a single scan.
struct ScanContext<'a> {
    counters: ScanCounters,
    diagnostics: Vec<Diagnostic>,
    progress_interval: u64,
    progress_tx: Option<&'a mpsc::Sender<ScanProgress>>,
}

impl ScanContext<'_> {
    fn access_denied(&mut self, path: &Path, message: String) {
        warn!(path = %path.display(), error = %message, "Permission denied, skipping subtree");
        self.counters.access_denied += 1;
        self.diagnostics.push(Diagnostic::AccessDenied {
            path: path.to_path_buf(),
            message,
        });
    }

    fn record_emitted(&mut self, record: &FileRecord, dirs_scanned: u64) {
        if record.sidecar.is_missing() {
            warn!(
                data_file = %record.data_file_path,
                expected = %record.sidecar.expected_name(),
                "Sidecar not found"
            );
            self.counters.missing_sidecars += 1;
            self.diagnostics.push(Diagnostic::MissingSidecar {
                data_file_path: record.data_file_path.clone(),
                expected: record.sidecar.expected_name().to_string(),
            });
        }

        self.counters.files_processed += 1;
        let processed = self.counters.files_processed;
        if self.progress_interval > 0 && processed % self.progress_interval == 0 {
            info!(processed, dirs = dirs_scanned, "Scan progress");
            if let Some(tx) = self.progress_tx {
                let _ = tx.send(ScanProgress {
                    files_processed: processed,
                    dirs_scanned,
                    current_file: Some(record.data_file_path.clone()),
                });
            }
        }
    }
}

/// Runs scans for one configuration
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan without progress reporting.
    pub fn scan<S: RecordSink + ?Sized>(&self, sink: &mut S) -> Result<ScanReport> {
        self.scan_with_progress(sink, None)
    }

    /// Scan, sending a [`ScanProgress`] every `progress_interval` records.
    ///
    /// Permission failures, missing sidecars and (unless strict) malformed
    /// paths are reported in the returned [`ScanReport`]. Any other error
    /// stops the scan; rows already written to `sink` are kept.
    pub fn scan_with_progress<S: RecordSink + ?Sized>(
        &self,
        sink: &mut S,
        progress_tx: Option<mpsc::Sender<ScanProgress>>,
    ) -> Result<ScanReport> {
        let start = Instant::now();
        let root = self.config.root_directory.as_path();
        validate_scan_path(root)?;

        info!(
            root = %root.display(),
            verify_sidecars = self.config.verify_sidecars,
            sorted = self.config.sort_entries,
            strict = self.config.strict,
            "Starting scan"
        );

        let mut ctx = ScanContext {
            counters: ScanCounters::default(),
            diagnostics: Vec::new(),
            progress_interval: self.config.progress_interval as u64,
            progress_tx: progress_tx.as_ref(),
        };

        let extractor = Extractor::from_config(&self.config);
        let walker = TreeWalker::new(root).sort_entries(self.config.sort_entries);
        let mut walk = walker.walk();

        while let Some(event) = walk.next() {
            let entry = match event? {
                WalkEvent::File(entry) => entry,
                WalkEvent::AccessDenied { path, message } => {
                    ctx.access_denied(&path, message);
                    continue;
                }
            };
            ctx.counters.files_seen += 1;

            let rel_path = relative_path(root, entry.path());
            match extractor.extract_file(&rel_path, entry.path()) {
                Ok(Extraction::Record(record)) => {
                    sink.write_record(&record)?;
                    ctx.record_emitted(&record, walk.dirs_scanned());
                }
                Ok(Extraction::Skipped(reason)) => {
                    debug!(path = %rel_path, reason = reason.as_str(), "Skipping file");
                    ctx.counters.files_skipped += 1;
                }
                Err(err) if self.config.strict => return Err(err.into()),
                Err(err) => {
                    warn!(path = %rel_path, error = %err.kind, "Skipping malformed path");
                    ctx.counters.malformed_paths += 1;
                    ctx.diagnostics.push(Diagnostic::MalformedPath {
                        path: rel_path,
                        message: err.kind.to_string(),
                    });
                }
            }
        }
        ctx.counters.dirs_scanned = walk.dirs_scanned();

        sink.finish()?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            root = %root.display(),
            processed = ctx.counters.files_processed,
            seen = ctx.counters.files_seen,
            skipped = ctx.counters.files_skipped,
            malformed = ctx.counters.malformed_paths,
            access_denied = ctx.counters.access_denied,
            missing_sidecars = ctx.counters.missing_sidecars,
            dirs = ctx.counters.dirs_scanned,
            duration_ms,
            "Scan complete"
        );

        Ok(ScanReport {
            counters: ctx.counters,
            diagnostics: ctx.diagnostics,
            duration_ms,
        })
    }
}
