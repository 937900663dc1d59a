//! Record extraction from dataset-relative paths
//!
//! A data file lives at `sub-<id>/ses-<label>/<modality>/<filename>`. Decoding
//! that path needs no filesystem access; only the optional sidecar check
//! touches the disk.
//!
//! ```text
//! sub-01/ses-pre/anat/sub-01_ses-pre_T1w.nii.gz
//! │      │       │    └─ stem "sub-01_ses-pre_T1w" → scan_type "T1w",
//! │      │       │       sidecar "sub-01_ses-pre_T1w.json"
//! │      │       └─ modality "anat"
//! │      └─ visit_label "pre"
//! └─ participant_id "01"
//! ```

use crate::config::{ScanConfig, DEFAULT_EXTENSIONS};
use crate::error::{MalformedKind, MalformedPathError};
use crate::types::{FileRecord, PathRecord, Sidecar};
use std::path::{Path, PathBuf};

/// Dataset-level metadata file, never a data file
pub const DATASET_DESCRIPTION: &str = "dataset_description.json";
/// Participant table, never a data file
pub const PARTICIPANTS_TABLE: &str = "participants.tsv";
/// Extension of sidecar files
pub const SIDECAR_EXTENSION: &str = "json";
pub const PARTICIPANT_PREFIX: &str = "sub-";
pub const VISIT_PREFIX: &str = "ses-";
/// participant / visit / modality / filename
pub const MIN_SEGMENTS: usize = 4;

/// Why a file produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DatasetDescription,
    ParticipantsTable,
    /// JSON sidecars only appear through their data file's record
    Sidecar,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatasetDescription => "dataset_description",
            Self::ParticipantsTable => "participants_table",
            Self::Sidecar => "sidecar",
        }
    }
}

/// Outcome of extracting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Record(FileRecord),
    Skipped(SkipReason),
}

impl Extraction {
    pub fn into_record(self) -> Option<FileRecord> {
        match self {
            Extraction::Record(record) => Some(record),
            Extraction::Skipped(_) => None,
        }
    }
}

/// Skip rule for a bare file name.
pub fn skip_reason(file_name: &str) -> Option<SkipReason> {
    if file_name == DATASET_DESCRIPTION {
        return Some(SkipReason::DatasetDescription);
    }
    if file_name == PARTICIPANTS_TABLE {
        return Some(SkipReason::ParticipantsTable);
    }
    match split_extension(file_name) {
        Some((_, ext)) if ext == SIDECAR_EXTENSION => Some(SkipReason::Sidecar),
        _ => None,
    }
}

/// Split off the final extension. Dotfiles like `.bidsignore` have none.
fn split_extension(name: &str) -> Option<(&str, &str)> {
    match name.rsplit_once('.') {
        Some((head, ext)) if !head.is_empty() => Some((head, ext)),
        _ => None,
    }
}

/// Remove known extensions one at a time until none is left.
///
/// `x_bold.nii.gz` → `x_bold`; `x_acq-1.5T_T1w.nii` → `x_acq-1.5T_T1w`
/// because `5T_T1w` is not a known extension.
pub fn strip_extensions<'a, S: AsRef<str>>(file_name: &'a str, extensions: &[S]) -> &'a str {
    let mut stem = file_name;
    while let Some((head, ext)) = split_extension(stem) {
        if !extensions.iter().any(|k| k.as_ref().eq_ignore_ascii_case(ext)) {
            break;
        }
        stem = head;
    }
    stem
}

/// Sidecar file name for a data file name.
pub fn sidecar_name<S: AsRef<str>>(file_name: &str, extensions: &[S]) -> String {
    format!("{}.{}", strip_extensions(file_name, extensions), SIDECAR_EXTENSION)
}

/// Drop the fixed prefix by length.
///
/// Only a segment shorter than the prefix fails, so `Sub-01` gives `01` and
/// `ses-` gives an empty label. With `require_prefix` the literal prefix and a
/// non-empty label are also required.
fn strip_label<'a>(
    segment: &'a str,
    prefix: &'static str,
    require_prefix: bool,
) -> Result<&'a str, MalformedKind> {
    let prefix_chars = prefix.chars().count();
    if segment.chars().count() < prefix_chars {
        return Err(MalformedKind::SegmentTooShort {
            segment: segment.to_string(),
            prefix,
        });
    }
    let label = segment
        .char_indices()
        .nth(prefix_chars)
        .map_or("", |(idx, _)| &segment[idx..]);
    if require_prefix {
        if !segment.starts_with(prefix) {
            return Err(MalformedKind::PrefixMismatch {
                segment: segment.to_string(),
                prefix,
            });
        }
        if label.is_empty() {
            return Err(MalformedKind::EmptyLabel {
                segment: segment.to_string(),
                prefix,
            });
        }
    }
    Ok(label)
}

/// Decode the four identity fields from a `/`-separated relative path.
///
/// Total for any path with at least four segments whose first two segments
/// are at least as long as `sub-` / `ses-`. The scan type comes from the
/// final segment, so deeper layouts such as `sub-01/ses-1/eeg/extra/file.edf`
/// still decode.
pub fn parse_path<S: AsRef<str>>(
    rel_path: &str,
    extensions: &[S],
) -> Result<PathRecord, MalformedPathError> {
    decode(rel_path, extensions, false)
}

/// [`parse_path`] that also rejects segments without the literal `sub-` /
/// `ses-` prefix or with nothing after it.
pub fn parse_path_checked<S: AsRef<str>>(
    rel_path: &str,
    extensions: &[S],
) -> Result<PathRecord, MalformedPathError> {
    decode(rel_path, extensions, true)
}

fn decode<S: AsRef<str>>(
    rel_path: &str,
    extensions: &[S],
    require_prefixes: bool,
) -> Result<PathRecord, MalformedPathError> {
    let segments: Vec<&str> = rel_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < MIN_SEGMENTS {
        return Err(MalformedPathError::new(
            rel_path,
            MalformedKind::TooFewSegments {
                found: segments.len(),
                expected: MIN_SEGMENTS,
            },
        ));
    }

    let malformed = |kind| MalformedPathError::new(rel_path, kind);
    let participant_id =
        strip_label(segments[0], PARTICIPANT_PREFIX, require_prefixes).map_err(malformed)?;
    let visit_label =
        strip_label(segments[1], VISIT_PREFIX, require_prefixes).map_err(malformed)?;
    let modality = segments[2];

    let file_name = segments[segments.len() - 1];
    let stem = strip_extensions(file_name, extensions);
    let scan_type = stem.rsplit('_').next().unwrap_or(stem);

    Ok(PathRecord {
        participant_id: participant_id.to_string(),
        visit_label: visit_label.to_string(),
        modality: modality.to_string(),
        scan_type: scan_type.to_string(),
    })
}

/// Turns relative paths into [`FileRecord`]s.
#[derive(Debug, Clone)]
pub struct Extractor {
    root: PathBuf,
    extensions: Vec<String>,
    verify_sidecars: bool,
    require_prefixes: bool,
}

impl Extractor {
    /// Extractor with the default extension list and no sidecar checks
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            verify_sidecars: false,
            require_prefixes: false,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            root: config.root_directory.clone(),
            extensions: config.extensions.clone(),
            verify_sidecars: config.verify_sidecars,
            require_prefixes: config.require_prefixes,
        }
    }

    pub fn verify_sidecars(mut self, verify: bool) -> Self {
        self.verify_sidecars = verify;
        self
    }

    pub fn require_prefixes(mut self, require: bool) -> Self {
        self.require_prefixes = require;
        self
    }

    /// Extract one file, given its path relative to the root.
    pub fn extract(&self, rel_path: &str) -> Result<Extraction, MalformedPathError> {
        self.extract_file(rel_path, &self.root.join(rel_path))
    }

    /// Extract a file the walker found at `data_file`.
    ///
    /// `rel_path` is only decoded; the sidecar check looks next to
    /// `data_file`, so names that are not valid UTF-8 still resolve.
    pub fn extract_file(
        &self,
        rel_path: &str,
        data_file: &Path,
    ) -> Result<Extraction, MalformedPathError> {
        let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        if let Some(reason) = skip_reason(file_name) {
            return Ok(Extraction::Skipped(reason));
        }

        let path = decode(rel_path, &self.extensions, self.require_prefixes)?;
        let name = sidecar_name(file_name, &self.extensions);
        let sidecar = if self.verify_sidecars {
            let exists = data_file
                .parent()
                .is_some_and(|dir| dir.join(&name).exists());
            if exists {
                Sidecar::Found(name)
            } else {
                Sidecar::Missing { expected: name }
            }
        } else {
            Sidecar::Unverified(name)
        };

        Ok(Extraction::Record(FileRecord {
            path,
            data_file_path: rel_path.to_string(),
            sidecar,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn extract(rel_path: &str) -> Result<Extraction, MalformedPathError> {
        Extractor::new("/unused").extract(rel_path)
    }

    fn kind(rel_path: &str) -> MalformedKind {
        extract(rel_path).unwrap_err().kind
    }

    #[test]
    fn test_round_trip_compound_extension() {
        let rel = "sub-A/ses-B/MOD/sub-A_ses-B_MOD_SCAN.nii.gz";
        let record = extract(rel).unwrap().into_record().unwrap();

        assert_eq!(record.path.participant_id, "A");
        assert_eq!(record.path.visit_label, "B");
        assert_eq!(record.path.modality, "MOD");
        assert_eq!(record.path.scan_type, "SCAN");
        assert_eq!(record.data_file_path, rel);
        assert_eq!(
            record.sidecar,
            Sidecar::Unverified("sub-A_ses-B_MOD_SCAN.json".to_string())
        );
    }

    #[test]
    fn test_single_extension() {
        let record = extract("sub-01/ses-1/dwi/sub-01_ses-1_dwi.bval")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.path.scan_type, "dwi");
        assert_eq!(record.sidecar.as_column(), "sub-01_ses-1_dwi.json");
    }

    #[test]
    fn test_unknown_extension_stays_in_stem() {
        let exts = ["nii"];
        assert_eq!(
            strip_extensions("sub-01_ses-1_acq-1.5T_T1w.nii", &exts),
            "sub-01_ses-1_acq-1.5T_T1w"
        );
        assert_eq!(strip_extensions("scan.raw", &exts), "scan.raw");
        assert_eq!(strip_extensions("scan.NII", &exts), "scan");
    }

    #[test]
    fn test_stem_without_underscore_is_scan_type() {
        let record = extract("sub-01/ses-1/anat/T1w.nii")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.path.scan_type, "T1w");
    }

    #[test]
    fn test_skip_rules() {
        assert_eq!(
            extract("dataset_description.json").unwrap(),
            Extraction::Skipped(SkipReason::DatasetDescription)
        );
        assert_eq!(
            extract("participants.tsv").unwrap(),
            Extraction::Skipped(SkipReason::ParticipantsTable)
        );
        assert_eq!(
            extract("sub-01/ses-1/participants.tsv").unwrap(),
            Extraction::Skipped(SkipReason::ParticipantsTable)
        );
        assert_eq!(
            extract("sub-01/ses-1/anat/sub-01_ses-1_T1w.json").unwrap(),
            Extraction::Skipped(SkipReason::Sidecar)
        );
        assert_eq!(
            extract("task-rest_bold.json").unwrap(),
            Extraction::Skipped(SkipReason::Sidecar)
        );
    }

    #[test]
    fn test_json_is_only_skipped_as_final_extension() {
        let record = extract("sub-01/ses-1/beh/sub-01_ses-1_events.json.gz")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.path.scan_type, "events");
    }

    #[test]
    fn test_too_few_segments() {
        assert_eq!(
            kind("README"),
            MalformedKind::TooFewSegments {
                found: 1,
                expected: 4
            }
        );
        assert_eq!(
            kind("sub-01/ses-1/sub-01_ses-1_scans.tsv"),
            MalformedKind::TooFewSegments {
                found: 3,
                expected: 4
            }
        );
    }

    #[test]
    fn test_segment_shorter_than_prefix() {
        assert_eq!(
            kind("sub/ses-1/anat/x_T1w.nii"),
            MalformedKind::SegmentTooShort {
                segment: "sub".to_string(),
                prefix: PARTICIPANT_PREFIX
            }
        );
        assert_eq!(
            kind("sub-01/s/anat/x_T1w.nii"),
            MalformedKind::SegmentTooShort {
                segment: "s".to_string(),
                prefix: VISIT_PREFIX
            }
        );
    }

    #[test]
    fn test_prefix_is_stripped_by_length() {
        let record = extract("sub-01/ses-/anat/sub-01_T1w.nii")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.path.participant_id, "01");
        assert_eq!(record.path.visit_label, "");

        let record = extract("Sub-01/ses-1/anat/x_T1w.nii")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.path.participant_id, "01");

        let record = parse_path("derivatives/fmriprep/sub-01/x_bold.nii", DEFAULT_EXTENSIONS)
            .unwrap();
        assert_eq!(record.participant_id, "vatives");
        assert_eq!(record.visit_label, "prep");
        assert_eq!(record.scan_type, "bold");
    }

    #[test]
    fn test_multibyte_segment_is_not_split_mid_char() {
        let record = parse_path("süb-ä1/ses-1/anat/x_T1w.nii", DEFAULT_EXTENSIONS).unwrap();
        assert_eq!(record.participant_id, "ä1");
    }

    #[test]
    fn test_required_prefixes() {
        let checked = Extractor::new("/unused").require_prefixes(true);
        let kind = |rel: &str| checked.extract(rel).unwrap_err().kind;

        assert_eq!(
            kind("derivatives/fmriprep/sub-01/x_bold.nii"),
            MalformedKind::PrefixMismatch {
                segment: "derivatives".to_string(),
                prefix: PARTICIPANT_PREFIX
            }
        );
        assert_eq!(
            kind("Sub-01/ses-1/anat/x_T1w.nii"),
            MalformedKind::PrefixMismatch {
                segment: "Sub-01".to_string(),
                prefix: PARTICIPANT_PREFIX
            }
        );
        assert_eq!(
            kind("sub-01/ses-/anat/x_T1w.nii"),
            MalformedKind::EmptyLabel {
                segment: "ses-".to_string(),
                prefix: VISIT_PREFIX
            }
        );
        assert_eq!(
            parse_path_checked("sub-01/ses-1/anat/x_T1w.nii", DEFAULT_EXTENSIONS)
                .unwrap()
                .visit_label,
            "1"
        );
    }

    #[test]
    fn test_scan_type_from_final_segment_of_deep_path() {
        let record = extract("sub-01/ses-1/eeg/extra/x_eeg.edf")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.path.modality, "eeg");
        assert_eq!(record.path.scan_type, "eeg");
        assert_eq!(record.sidecar.as_column(), "x_eeg.json");
    }

    #[test]
    fn test_default_extensions_cover_image_and_meg_formats() {
        for (file, stem) in [
            ("x_T1w.dcm", "x_T1w"),
            ("x_sample.ome.tif", "x_sample"),
            ("x_photo.jpg", "x_photo"),
            ("x_photo.png", "x_photo"),
            ("x_meg.con", "x_meg"),
            ("x_meg.sqd", "x_meg"),
            ("x_ieeg.mefd", "x_ieeg"),
            ("x_ecephys.nwb", "x_ecephys"),
        ] {
            assert_eq!(strip_extensions(file, DEFAULT_EXTENSIONS), stem, "{file}");
        }
        let record = extract("sub-01/ses-1/anat/x_T1w.dcm")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.path.scan_type, "T1w");
        assert_eq!(record.sidecar.as_column(), "x_T1w.json");
    }

    #[test]
    fn test_error_carries_path() {
        let err = extract("sub-01/anat/x.nii").unwrap_err();
        assert_eq!(err.path, "sub-01/anat/x.nii");
        assert!(err.to_string().contains("sub-01/anat/x.nii"));
    }

    #[test]
    fn test_verify_finds_sidecar() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sub-01/ses-1/func");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("sub-01_ses-1_task-rest_bold.nii.gz"), b"").unwrap();
        fs::write(dir.join("sub-01_ses-1_task-rest_bold.json"), b"{}").unwrap();

        let extractor = Extractor::new(temp.path()).verify_sidecars(true);
        let record = extractor
            .extract("sub-01/ses-1/func/sub-01_ses-1_task-rest_bold.nii.gz")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(
            record.sidecar,
            Sidecar::Found("sub-01_ses-1_task-rest_bold.json".to_string())
        );
    }

    #[test]
    fn test_verify_reports_missing_sidecar() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sub-01/ses-1/anat");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("sub-01_ses-1_T1w.nii.gz"), b"").unwrap();

        let extractor = Extractor::new(temp.path()).verify_sidecars(true);
        let record = extractor
            .extract("sub-01/ses-1/anat/sub-01_ses-1_T1w.nii.gz")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.sidecar.as_column(), "missing");
        assert_eq!(record.sidecar.expected_name(), "sub-01_ses-1_T1w.json");
    }

    #[test]
    fn test_verify_looks_next_to_data_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("elsewhere");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("sub-01_ses-1_T1w.nii.gz"), b"").unwrap();
        fs::write(dir.join("sub-01_ses-1_T1w.json"), b"{}").unwrap();

        let extractor = Extractor::new(temp.path()).verify_sidecars(true);
        let record = extractor
            .extract_file(
                "sub-01/ses-1/anat/sub-01_ses-1_T1w.nii.gz",
                &dir.join("sub-01_ses-1_T1w.nii.gz"),
            )
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(
            record.sidecar,
            Sidecar::Found("sub-01_ses-1_T1w.json".to_string())
        );
    }

    #[test]
    fn test_no_verification_keeps_computed_name() {
        let extractor = Extractor::new("/nonexistent/root");
        let record = extractor
            .extract("sub-01/ses-1/anat/sub-01_ses-1_T1w.nii.gz")
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(
            record.sidecar,
            Sidecar::Unverified("sub-01_ses-1_T1w.json".to_string())
        );
    }

    proptest! {
        #[test]
        fn decoding_recovers_labels(
            participant in "[A-Za-z0-9]{1,8}",
            visit in "[A-Za-z0-9]{1,8}",
            modality in "[a-z]{2,6}",
            scan in "[A-Za-z0-9]{1,8}",
        ) {
            let stem = format!("sub-{participant}_ses-{visit}_{scan}");
            let rel = format!("sub-{participant}/ses-{visit}/{modality}/{stem}.nii.gz");

            let first = extract(&rel).unwrap();
            let second = extract(&rel).unwrap();
            prop_assert_eq!(&first, &second);

            let record = first.into_record().unwrap();
            prop_assert_eq!(record.path.participant_id, participant);
            prop_assert_eq!(record.path.visit_label, visit);
            prop_assert_eq!(record.path.modality, modality);
            prop_assert_eq!(record.path.scan_type, scan);
            prop_assert_eq!(record.sidecar.as_column(), format!("{stem}.json"));
        }
    }
}
