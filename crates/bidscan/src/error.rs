//! Error types for bidscan

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for a scan.
///
/// Only failures that stop a scan end up here. Permission failures on a
/// subtree and missing sidecars are diagnostics, not errors.
#[derive(Error, Debug)]
pub enum BidscanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    ScanPath(#[from] ScanPathError),

    #[error(transparent)]
    MalformedPath(#[from] MalformedPathError),
}

/// Problems with the scan root, detected before traversal starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanPathError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotDirectory(PathBuf),

    #[error("Cannot read directory: {}", .0.display())]
    NotReadable(PathBuf),
}

/// A relative path that does not follow `sub-*/ses-*/<modality>/<file>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed path '{path}': {kind}")]
pub struct MalformedPathError {
    pub path: String,
    pub kind: MalformedKind,
}

/// What exactly is wrong with a malformed path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedKind {
    #[error("expected at least {expected} segments, found {found}")]
    TooFewSegments { found: usize, expected: usize },

    #[error("segment '{segment}' is shorter than its '{prefix}' prefix")]
    SegmentTooShort {
        segment: String,
        prefix: &'static str,
    },

    #[error("segment '{segment}' does not start with '{prefix}'")]
    PrefixMismatch {
        segment: String,
        prefix: &'static str,
    },

    #[error("segment '{segment}' has no label after '{prefix}'")]
    EmptyLabel {
        segment: String,
        prefix: &'static str,
    },
}

impl MalformedPathError {
    pub fn new(path: impl Into<String>, kind: MalformedKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BidscanError>;
