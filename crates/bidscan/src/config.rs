//! Scan configuration

use crate::error::{BidscanError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions stripped from a filename to find its stem.
///
/// Stripping repeats while the final extension is in this list, so compound
/// suffixes such as `.nii.gz` come off in two steps.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    // MRI
    "nii", "gz", "mgz", "mgh", "dcm", "bval", "bvec",
    // EEG / iEEG / MEG / NIRS
    "edf", "bdf", "vhdr", "vmrk", "eeg", "set", "fdt", "fif", "con", "sqd", "mefd", "nwb",
    "snirf",
    // Microscopy and photos
    "tif", "tiff", "ome", "png", "jpg", "jpeg",
    // Tables, archives, misc
    "json", "tsv", "mat", "tar", "zip", "txt",
];

/// Configuration for a single scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Dataset root to traverse
    pub root_directory: PathBuf,

    /// Check that every computed sidecar exists on disk (one stat per data file)
    #[serde(default)]
    pub verify_sidecars: bool,

    /// Sort directory children by name so output order is stable across runs
    #[serde(default)]
    pub sort_entries: bool,

    /// Abort on the first malformed path instead of skipping it with a warning
    #[serde(default)]
    pub strict: bool,

    /// Also treat segments without the literal `sub-` / `ses-` prefix, or
    /// with nothing after it, as malformed
    #[serde(default)]
    pub require_prefixes: bool,

    /// Emit a progress update every N records
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Known single extensions removed when computing a stem
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_progress_interval() -> usize {
    100
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl ScanConfig {
    /// Configuration with defaults for everything but the root
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            verify_sidecars: false,
            sort_entries: false,
            strict: false,
            require_prefixes: false,
            progress_interval: default_progress_interval(),
            extensions: default_extensions(),
        }
    }

    pub fn with_verify_sidecars(mut self, verify: bool) -> Self {
        self.verify_sidecars = verify;
        self
    }

    pub fn with_sort_entries(mut self, sort: bool) -> Self {
        self.sort_entries = sort;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_require_prefixes(mut self, require: bool) -> Self {
        self.require_prefixes = require;
        self
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ScanConfig =
            toml::from_str(&content).map_err(|e| BidscanError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| BidscanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::new("/data/bids");
        assert_eq!(config.root_directory, PathBuf::from("/data/bids"));
        assert!(!config.verify_sidecars);
        assert!(!config.sort_entries);
        assert!(!config.strict);
        assert!(!config.require_prefixes);
        assert_eq!(config.progress_interval, 100);
        assert!(config.extensions.iter().any(|e| e == "gz"));
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ScanConfig = toml::from_str(r#"root_directory = "/mnt/dataset""#).unwrap();
        assert_eq!(config.root_directory, PathBuf::from("/mnt/dataset"));
        assert!(!config.verify_sidecars);
        assert_eq!(config.progress_interval, 100);
        assert_eq!(config.extensions.len(), DEFAULT_EXTENSIONS.len());
    }

    #[test]
    fn test_root_is_required() {
        let parsed: std::result::Result<ScanConfig, _> = toml::from_str("verify_sidecars = true");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bidscan.toml");

        let config = ScanConfig::new("/mnt/dataset")
            .with_verify_sidecars(true)
            .with_sort_entries(true);
        config.save(&path).unwrap();

        let loaded = ScanConfig::load(&path).unwrap();
        assert!(loaded.verify_sidecars);
        assert!(loaded.sort_entries);
        assert!(!loaded.strict);
        assert_eq!(loaded.root_directory, config.root_directory);
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.toml");
        std::fs::write(&path, "root_directory = ").unwrap();

        let err = ScanConfig::load(&path).unwrap_err();
        assert!(matches!(err, BidscanError::Config(_)));
    }
}
