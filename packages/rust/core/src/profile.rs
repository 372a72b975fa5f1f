//! Business profile loading.

use std::io::ErrorKind;
use std::path::Path;

use bidflow_shared::{BidFlowError, Profile, ProfileSource, Result};
use tracing::{info, warn};

/// Description used when no profile file exists.
pub const FALLBACK_PROFILE: &str =
    "Global Software Engineering firm specializing in AI Automation and Enterprise RAG.";

/// Read the profile at `path` verbatim, or fall back to [`FALLBACK_PROFILE`]
/// when the file does not exist. Any other read failure is an error.
pub fn load_profile(path: &Path) -> Result<Profile> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            info!(path = %path.display(), chars = text.chars().count(), "loaded business profile");
            Ok(Profile {
                text,
                source: ProfileSource::File(path.to_path_buf()),
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "business profile not found, using built-in description");
            Ok(Profile {
                text: FALLBACK_PROFILE.to_string(),
                source: ProfileSource::Fallback,
            })
        }
        Err(e) => Err(BidFlowError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_returns_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let profile = load_profile(&dir.path().join("business_profile.txt")).expect("load");
        assert_eq!(
            profile.text,
            "Global Software Engineering firm specializing in AI Automation and Enterprise RAG."
        );
        assert!(profile.is_fallback());
    }

    #[test]
    fn existing_file_is_returned_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("business_profile.txt");
        let body = "ISO 27001 certified.\nSOC2 Type II.\n\n  Offices in London and Dubai.  \n";
        std::fs::write(&path, body).expect("write");

        let profile = load_profile(&path).expect("load");
        assert_eq!(profile.text, body);
        assert_eq!(profile.source, ProfileSource::File(path));
    }

    #[test]
    fn empty_file_is_not_replaced_by_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("business_profile.txt");
        std::fs::write(&path, "").expect("write");

        let profile = load_profile(&path).expect("load");
        assert_eq!(profile.text, "");
        assert!(!profile.is_fallback());
    }

    #[test]
    fn invalid_utf8_propagates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("business_profile.txt");
        std::fs::write(&path, [0xff, 0xfe, 0xfd]).expect("write");

        let err = load_profile(&path).unwrap_err();
        assert!(matches!(err, BidFlowError::Io { .. }));
    }

    #[test]
    fn directory_path_propagates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_profile(dir.path()).unwrap_err();
        assert!(matches!(err, BidFlowError::Io { .. }));
    }
}
