//! Error types for BidFlow.
//!
//! Library crates use [`BidFlowError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all BidFlow operations.
#[derive(Debug, thiserror::Error)]
pub enum BidFlowError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A tender document could not be read or its text extracted.
    #[error("document error in {name}: {message}")]
    Document { name: String, message: String },

    /// The language-model backend failed (auth, timeout, rate limit, bad body).
    #[error("model backend error: {0}")]
    ModelBackend(String),

    /// A pipeline stage was invoked before the stage it depends on.
    #[error("precondition failed: {message}")]
    Precondition { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty upload, bad task wiring, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BidFlowError>;

impl BidFlowError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a document error for the named upload.
    pub fn document(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Document {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a precondition error from any displayable message.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short, user-facing explanation that separates unreadable documents
    /// from an unavailable response service.
    pub fn user_message(&self) -> String {
        match self {
            Self::Document { name, .. } => {
                format!("Your documents could not be read ({name}).")
            }
            Self::ModelBackend(_) => {
                "The response service is unavailable. Try again shortly.".to_string()
            }
            Self::Precondition { message } => message.clone(),
            Self::Config { message } | Self::Validation { message } => message.clone(),
            Self::Io { path, .. } => format!("Could not access {}.", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BidFlowError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = BidFlowError::document("rfp.pdf", "unexpected EOF");
        assert_eq!(err.to_string(), "document error in rfp.pdf: unexpected EOF");
    }

    #[test]
    fn user_message_separates_documents_from_backend() {
        let doc = BidFlowError::document("itt.pdf", "corrupt xref");
        let backend = BidFlowError::ModelBackend("HTTP 503".into());

        assert!(doc.user_message().contains("documents could not be read"));
        assert!(doc.user_message().contains("itt.pdf"));
        assert!(backend.user_message().contains("response service is unavailable"));
        assert!(!backend.user_message().contains("503"));
    }
}
