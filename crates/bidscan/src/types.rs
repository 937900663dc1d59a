//! Core types for bidscan
//!
//! A scan turns every data file under the dataset root into one
//! [`FileRecord`]: the identity decoded from its path plus the location of
//! its JSON sidecar.

use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// Column text written when sidecar verification finds no file.
pub const MISSING_SIDECAR: &str = "missing";

/// Output column order for every row sink.
pub const RECORD_COLUMNS: [&str; 6] = [
    "participant_id",
    "visit_label",
    "modality",
    "scan_type",
    "data_file_path",
    "sidecar_file_path",
];

// ============================================================================
// Records
// ============================================================================

/// Identity of a data file, decoded purely from its relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRecord {
    /// Segment 1 without its `sub-` marker
    pub participant_id: String,
    /// Segment 2 without its `ses-` marker
    pub visit_label: String,
    /// Segment 3, verbatim
    pub modality: String,
    /// Last `_`-separated token of the filename stem
    pub scan_type: String,
}

/// Where a data file's JSON sidecar lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sidecar {
    /// Computed name; existence was not checked
    Unverified(String),
    /// Computed name; the file exists
    Found(String),
    /// Verification ran and found nothing at the computed name
    Missing { expected: String },
}

impl Sidecar {
    /// Text written to the `sidecar_file_path` column.
    pub fn as_column(&self) -> &str {
        match self {
            Sidecar::Unverified(name) | Sidecar::Found(name) => name,
            Sidecar::Missing { .. } => MISSING_SIDECAR,
        }
    }

    /// The sidecar name computed from the data file, whether or not it exists.
    pub fn expected_name(&self) -> &str {
        match self {
            Sidecar::Unverified(name) | Sidecar::Found(name) => name,
            Sidecar::Missing { expected } => expected,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Sidecar::Missing { .. })
    }
}

impl Serialize for Sidecar {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_column())
    }
}

/// One output row: a decoded data file and its sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    #[serde(flatten)]
    pub path: PathRecord,
    /// Data file path relative to the scan root
    pub data_file_path: String,
    #[serde(rename = "sidecar_file_path")]
    pub sidecar: Sidecar,
}

impl FileRecord {
    /// Fields in [`RECORD_COLUMNS`] order.
    pub fn to_row(&self) -> [&str; 6] {
        [
            self.path.participant_id.as_str(),
            self.path.visit_label.as_str(),
            self.path.modality.as_str(),
            self.path.scan_type.as_str(),
            self.data_file_path.as_str(),
            self.sidecar.as_column(),
        ]
    }
}

// ============================================================================
// Scan state
// ============================================================================

/// Per-scan counters. A fresh set is created for every scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounters {
    /// Records emitted to the sink
    pub files_processed: u64,
    /// Regular files yielded by the walker
    pub files_seen: u64,
    /// Files matched by a skip rule
    pub files_skipped: u64,
    /// Files whose path did not decode
    pub malformed_paths: u64,
    /// Directories that could not be listed
    pub access_denied: u64,
    /// Records emitted with the missing-sidecar sentinel
    pub missing_sidecars: u64,
    /// Directories entered by the walker
    pub dirs_scanned: u64,
}

/// Progress update during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Records emitted so far
    pub files_processed: u64,
    /// Directories entered so far
    pub dirs_scanned: u64,
    /// Relative path of the last emitted record
    pub current_file: Option<String>,
}

/// Non-fatal events reported during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A directory could not be listed; its subtree was skipped
    AccessDenied { path: PathBuf, message: String },
    /// Verification found no sidecar for a data file
    MissingSidecar {
        data_file_path: String,
        expected: String,
    },
    /// A file path did not decode and the file was skipped
    MalformedPath { path: String, message: String },
}

/// Result of a completed scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub counters: ScanCounters,
    pub diagnostics: Vec<Diagnostic>,
    pub duration_ms: u64,
}

impl ScanReport {
    pub fn missing_sidecar_warnings(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::MissingSidecar { .. }))
            .count()
    }

    pub fn access_denied_paths(&self) -> Vec<&PathBuf> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::AccessDenied { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sidecar: Sidecar) -> FileRecord {
        FileRecord {
            path: PathRecord {
                participant_id: "01".to_string(),
                visit_label: "baseline".to_string(),
                modality: "anat".to_string(),
                scan_type: "T1w".to_string(),
            },
            data_file_path: "sub-01/ses-baseline/anat/sub-01_ses-baseline_T1w.nii.gz".to_string(),
            sidecar,
        }
    }

    #[test]
    fn row_follows_column_order() {
        let rec = record(Sidecar::Unverified("sub-01_ses-baseline_T1w.json".to_string()));
        assert_eq!(
            rec.to_row(),
            [
                "01",
                "baseline",
                "anat",
                "T1w",
                "sub-01/ses-baseline/anat/sub-01_ses-baseline_T1w.nii.gz",
                "sub-01_ses-baseline_T1w.json",
            ]
        );
    }

    #[test]
    fn missing_sidecar_renders_sentinel() {
        let sidecar = Sidecar::Missing {
            expected: "sub-01_ses-baseline_T1w.json".to_string(),
        };
        assert_eq!(sidecar.as_column(), MISSING_SIDECAR);
        assert_eq!(sidecar.expected_name(), "sub-01_ses-baseline_T1w.json");
        assert!(sidecar.is_missing());
    }

    #[test]
    fn json_uses_column_names() {
        let rec = record(Sidecar::Found("sub-01_ses-baseline_T1w.json".to_string()));
        let value = serde_json::to_value(&rec).unwrap();
        for column in RECORD_COLUMNS {
            assert!(value.get(column).is_some(), "missing {column}");
        }
        assert_eq!(value["sidecar_file_path"], "sub-01_ses-baseline_T1w.json");
    }
}
