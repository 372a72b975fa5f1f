//! Core domain types for BidFlow sessions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Header line placed before each document's text in the Vault.
pub fn source_header(name: &str) -> String {
    format!("\n--- SOURCE DOCUMENT: {name} ---\n")
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for interactive session identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Uploads and documents
// ---------------------------------------------------------------------------

/// One uploaded file as handed over by the presentation layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name shown to the user and written into the Vault header.
    pub name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Extracted text of a single uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub raw_text: String,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Concatenated text of one upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    text: String,
    documents: Vec<String>,
    fingerprint: String,
}

impl Vault {
    /// Build the Vault from documents in upload order.
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut text = String::new();
        for doc in documents {
            text.push_str(&source_header(&doc.name));
            text.push_str(&doc.raw_text);
        }

        let fingerprint = {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            format!("{:x}", hasher.finalize())
        };

        Self {
            text,
            documents: documents.iter().map(|d| d.name.clone()).collect(),
            fingerprint,
        }
    }

    /// The full Vault string.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Document names in upload order.
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// SHA-256 of the Vault text (hex).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Character count of the Vault text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Where the business profile text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    /// Read verbatim from this file.
    File(PathBuf),
    /// The file was absent; the built-in description is used.
    Fallback,
}

/// Static description of the bidding organisation's capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub text: String,
    pub source: ProfileSource,
}

impl Profile {
    pub fn is_fallback(&self) -> bool {
        self.source == ProfileSource::Fallback
    }
}

// ---------------------------------------------------------------------------
// Pipeline results
// ---------------------------------------------------------------------------

/// Output of one executed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Role of the agent that produced the output.
    pub role: String,
    /// Task title used as the section heading in accumulated output.
    pub title: String,
    /// Raw model text.
    pub raw: String,
}

/// Accumulated output of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// All task outputs of the run, in execution order.
    pub raw: String,
    /// Per-task outputs.
    pub tasks: Vec<TaskOutput>,
    /// Model identifier used for the run.
    pub model: String,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
    /// Question identifiers the output failed to address (response stage only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_ids: Vec<String>,
}
