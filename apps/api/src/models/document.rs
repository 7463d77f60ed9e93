use serde::{Deserialize, Serialize};

/// An uploaded file reduced to plain text. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Placeholder for a file whose extraction failed.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }
}

/// A résumé's similarity to the job description for one ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: f32,
    /// Zero-based upload position; used to find the source document again.
    #[serde(default)]
    pub position: usize,
}

/// Score records sorted by score descending, ties kept in upload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedResult {
    pub records: Vec<ScoreRecord>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no résumé was ranked.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoreRecord> {
        self.records.iter()
    }
}
