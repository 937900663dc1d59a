//! Parse command - decode relative paths without touching the filesystem

use bidscan::{Extraction, Extractor};
use serde_json::{json, Value};

/// Arguments for the parse command
#[derive(Debug)]
pub struct ParseArgs {
    pub paths: Vec<String>,
}

/// Print one JSON object per path, as an array.
pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    let values = decode_all(&args.paths);
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

fn decode_all(paths: &[String]) -> Vec<Value> {
    let extractor = Extractor::new(".");
    paths
        .iter()
        .map(|path| match extractor.extract(path) {
            Ok(Extraction::Record(record)) => json!({ "path": path, "record": record }),
            Ok(Extraction::Skipped(reason)) => json!({ "path": path, "skipped": reason.as_str() }),
            Err(err) => json!({ "path": path, "error": err.kind.to_string() }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_records_skips_and_errors() {
        let values = decode_all(&[
            "sub-01/ses-2/anat/sub-01_ses-2_T2w.nii.gz".to_string(),
            "participants.tsv".to_string(),
            "README".to_string(),
        ]);

        assert_eq!(values[0]["record"]["participant_id"], "01");
        assert_eq!(values[0]["record"]["visit_label"], "2");
        assert_eq!(values[0]["record"]["scan_type"], "T2w");
        assert_eq!(values[0]["record"]["sidecar_file_path"], "sub-01_ses-2_T2w.json");
        assert_eq!(values[1]["skipped"], "participants_table");
        assert!(values[2]["error"]
            .as_str()
            .unwrap()
            .contains("expected at least 4 segments"));
    }
}
