//! Scan command - inventory a dataset directory
//!
//! Writes one row per data file to `--output` (or stdout) and a short
//! summary to stderr.

use crate::cli::error::{explain, HelpfulError};
use bidscan::scan_path::{canonicalize_scan_path, expand_scan_path};
use bidscan::{CsvRecordSink, RecordSink, ScanConfig, ScanReport, Scanner};
use std::io;
use std::path::{Path, PathBuf};

/// Arguments for the scan command
#[derive(Debug, Default)]
pub struct ScanArgs {
    pub path: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub verify_sidecars: bool,
    pub sort: bool,
    pub strict: bool,
    pub require_prefixes: bool,
    pub tsv: bool,
    pub progress_interval: Option<usize>,
}

/// Execute the scan command
pub fn run(args: ScanArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let delimiter = if args.tsv { b'\t' } else { b',' };

    let mut sink: Box<dyn RecordSink> = match &args.output {
        Some(path) => Box::new(
            CsvRecordSink::create(path, delimiter)
                .map_err(|e| HelpfulError::cannot_create_output(path, &e.to_string()))?,
        ),
        None => Box::new(CsvRecordSink::with_delimiter(io::stdout().lock(), delimiter)),
    };

    let scanner = Scanner::new(config);
    let report = scanner.scan(&mut *sink).map_err(explain)?;
    print_summary(scanner.config().root_directory.as_path(), &report);
    Ok(())
}

/// Merge the config file (if any) with command-line flags.
///
/// Flags only ever switch options on; a PATH argument replaces the
/// configured root.
fn resolve_config(args: &ScanArgs) -> anyhow::Result<ScanConfig> {
    let mut config = match (&args.config, &args.path) {
        (Some(file), path) => {
            let mut config = ScanConfig::load(file)
                .map_err(|e| HelpfulError::invalid_config(file, &e.to_string()))?;
            if let Some(path) = path {
                config.root_directory = path.clone();
            }
            config
        }
        (None, Some(path)) => ScanConfig::new(path.clone()),
        (None, None) => return Err(HelpfulError::missing_root().into()),
    };

    config.root_directory = canonicalize_scan_path(&expand_scan_path(&config.root_directory));
    config.verify_sidecars |= args.verify_sidecars;
    config.sort_entries |= args.sort;
    config.strict |= args.strict;
    config.require_prefixes |= args.require_prefixes;
    if let Some(interval) = args.progress_interval {
        config.progress_interval = interval;
    }
    Ok(config)
}

fn print_summary(root: &Path, report: &ScanReport) {
    let c = &report.counters;
    eprintln!("Scanned {}", root.display());
    eprintln!("  records:          {}", c.files_processed);
    eprintln!("  files seen:       {}", c.files_seen);
    eprintln!("  skipped:          {}", c.files_skipped);
    eprintln!("  directories:      {}", c.dirs_scanned);
    if c.malformed_paths > 0 {
        eprintln!("  malformed paths:  {}", c.malformed_paths);
    }
    if c.missing_sidecars > 0 {
        eprintln!("  missing sidecars: {}", c.missing_sidecars);
    }
    if c.access_denied > 0 {
        eprintln!("  unreadable dirs:  {}", c.access_denied);
    }
    eprintln!("  took {} ms", report.duration_ms);
}
