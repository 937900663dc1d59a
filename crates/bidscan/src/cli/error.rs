//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use bidscan::{BidscanError, MalformedPathError, ScanPathError};
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Neither a PATH argument nor a config root was given
    pub fn missing_root() -> Self {
        Self::new("No dataset directory given")
            .with_context("scan needs the root of a sub-*/ses-* dataset")
            .with_suggestions([
                "TRY: bidscan scan /path/to/dataset",
                "TRY: set root_directory in a config file and pass --config",
            ])
    }

    /// Path does not exist
    pub fn path_not_found(path: &Path) -> Self {
        Self::new(format!("Path not found: {}", path.display()))
            .with_context("The dataset root does not exist on the filesystem")
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Check that the dataset mount is available".to_string(),
            ])
    }

    /// Path exists but is not a directory
    pub fn not_a_directory(path: &Path) -> Self {
        Self::new(format!("Not a directory: {}", path.display()))
            .with_context("The scan command expects the dataset root directory, not a file")
            .with_suggestions([format!(
                "TRY: Scan the parent directory: bidscan scan {}",
                path.parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".".to_string())
            )])
    }

    /// Root directory cannot be listed
    pub fn cannot_read_directory(path: &Path) -> Self {
        Self::new(format!("Cannot read directory: {}", path.display()))
            .with_context("The dataset root exists but could not be listed")
            .with_suggestions([
                format!("TRY: Check permissions: ls -ld {}", path.display()),
                "TRY: Run as a user with read access to the dataset".to_string(),
            ])
    }

    /// Config file could not be loaded
    pub fn invalid_config(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot load config: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: The file must be TOML with at least root_directory = \"...\"",
                "TRY: Omit --config and pass the dataset directory directly",
            ])
    }

    /// Output file could not be created
    pub fn cannot_create_output(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot create output file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Check that the output directory exists and is writable",
                "TRY: Omit --output to write to stdout",
            ])
    }

    /// Strict mode hit a path outside the dataset grammar
    pub fn malformed_path(err: &MalformedPathError) -> Self {
        Self::new(format!("Malformed dataset path: {}", err.path))
            .with_context(err.kind.to_string())
            .with_suggestions([
                "TRY: Expected layout is sub-<id>/ses-<label>/<modality>/<file>",
                "TRY: Drop --strict to skip such files with a warning",
            ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Attach operator guidance to the scan errors that have an obvious fix.
pub fn explain(err: BidscanError) -> anyhow::Error {
    match err {
        BidscanError::ScanPath(ScanPathError::NotFound(path)) => {
            HelpfulError::path_not_found(&path).into()
        }
        BidscanError::ScanPath(ScanPathError::NotDirectory(path)) => {
            HelpfulError::not_a_directory(&path).into()
        }
        BidscanError::ScanPath(ScanPathError::NotReadable(path)) => {
            HelpfulError::cannot_read_directory(&path).into()
        }
        BidscanError::MalformedPath(e) => HelpfulError::malformed_path(&e).into(),
        other => other.into(),
    }
}
