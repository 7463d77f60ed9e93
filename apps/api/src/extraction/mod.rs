//! Extractor — turns an uploaded file into a plain-text `Document`.
//!
//! Never fails past its boundary: a file that cannot be parsed becomes an
//! empty-text placeholder plus an `ExtractionIssue` that the caller surfaces.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::Document;

/// Extracted text shorter than this is flagged as possibly empty or image-based.
pub const MIN_TEXT_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF parse error: {0}")]
    Pdf(String),

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// A file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    fn is_plain_text(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/plain"))
            || self.name.to_lowercase().ends_with(".txt")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ExtractionFailed,
    LowContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A per-file problem reported back to the user. Never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionIssue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub message: String,
}

/// Result of extracting one upload: the document (possibly empty) and its issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub document: Document,
    pub char_count: usize,
    pub issues: Vec<ExtractionIssue>,
}

/// Concatenated page text of a PDF, trimmed.
pub async fn extract_pdf_text(bytes: Bytes) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))
    })
    .await
    .map_err(|e| ExtractionError::Task(e.to_string()))?
    .map(|text| text.trim().to_string())
}

/// Extracts one upload into a document, converting failures into issues.
pub async fn extract_document(upload: Upload) -> ExtractionOutcome {
    let mut issues = Vec::new();

    let text = if upload.is_plain_text() {
        String::from_utf8_lossy(&upload.bytes).trim().to_string()
    } else {
        match extract_pdf_text(upload.bytes.clone()).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Error reading {}: {e}", upload.name);
                issues.push(ExtractionIssue {
                    kind: IssueKind::ExtractionFailed,
                    severity: IssueSeverity::Error,
                    message: format!("Error reading {}: {e}", upload.name),
                });
                String::new()
            }
        }
    };

    if let Some(issue) = check_content_length(&upload.name, &text) {
        warn!("{}", issue.message);
        issues.push(issue);
    }

    ExtractionOutcome {
        char_count: text.chars().count(),
        document: Document::new(upload.name, text),
        issues,
    }
}

/// Extracts every upload in order. Each outcome is independent of the others.
pub async fn extract_all(uploads: Vec<Upload>) -> Vec<ExtractionOutcome> {
    let mut outcomes = Vec::with_capacity(uploads.len());
    for upload in uploads {
        outcomes.push(extract_document(upload).await);
    }
    outcomes
}

/// Low-content warning for text under `MIN_TEXT_CHARS` characters.
pub fn check_content_length(name: &str, text: &str) -> Option<ExtractionIssue> {
    (text.chars().count() < MIN_TEXT_CHARS).then(|| ExtractionIssue {
        kind: IssueKind::LowContent,
        severity: IssueSeverity::Warning,
        message: format!("{name} might be empty or image-based."),
    })
}
