//! Plain-text export of the final responses.

use std::path::{Path, PathBuf};

use bidflow_shared::{BidFlowError, PipelineResult, Result};
use tracing::{info, instrument};

/// Write `result.raw` to `dir/file_name`, replacing any earlier export.
#[instrument(skip_all, fields(dir = %dir.display(), file = file_name))]
pub fn export_submission(dir: &Path, file_name: &str, result: &PipelineResult) -> Result<PathBuf> {
    if file_name.trim().is_empty() || file_name.contains(['/', '\\']) {
        return Err(BidFlowError::validation(format!(
            "export file name must be a bare file name, got '{file_name}'"
        )));
    }

    std::fs::create_dir_all(dir).map_err(|e| BidFlowError::io(dir, e))?;
    let target = dir.join(file_name);
    let temp = dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &result.raw).map_err(|e| BidFlowError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| BidFlowError::io(&target, e))?;

    info!(path = %target.display(), bytes = result.raw.len(), "submission exported");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn responses(raw: &str) -> PipelineResult {
        PipelineResult {
            raw: raw.into(),
            tasks: Vec::new(),
            model: "scripted".into(),
            completed_at: Utc::now(),
            missing_ids: Vec::new(),
        }
    }

    #[test]
    fn writes_raw_text_under_fixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_submission(dir.path(), "Global_BidFlow_Submission.txt", &responses("## Q1\nAnswer"))
            .unwrap();
        assert_eq!(path, dir.path().join("Global_BidFlow_Submission.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "## Q1\nAnswer");
        assert!(!dir.path().join(".Global_BidFlow_Submission.txt.tmp").exists());
    }

    #[test]
    fn overwrites_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        export_submission(dir.path(), "out.txt", &responses("first")).unwrap();
        let path = export_submission(dir.path(), "out.txt", &responses("second")).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("bids").join("2026");
        let path = export_submission(&nested, "out.txt", &responses("x")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rejects_paths_as_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_submission(dir.path(), "../escape.txt", &responses("x")).unwrap_err();
        assert!(matches!(err, BidFlowError::Validation { .. }));
    }
}
