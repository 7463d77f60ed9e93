//! Similarity scoring — pluggable, trait-based scorers that measure each résumé
//! against a job description.
//!
//! `TfIdfScorer` is lexical and needs no model; `SemanticScorer` wraps the shared
//! sentence-embedding model. Callers pick one per run; the two are never blended.

pub mod semantic;
pub mod tfidf;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Document;

pub use semantic::SemanticScorer;
pub use tfidf::TfIdfScorer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    #[default]
    Lexical,
    Semantic,
}

impl ScoringStrategy {
    /// Column header used for the score in exports.
    pub fn score_column(self) -> &'static str {
        match self {
            ScoringStrategy::Lexical => "Score",
            ScoringStrategy::Semantic => "Semantic Score",
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringStrategy::Lexical => f.write_str("lexical"),
            ScoringStrategy::Semantic => f.write_str("semantic"),
        }
    }
}

impl FromStr for ScoringStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "lexical" | "tfidf" | "tf-idf" => Ok(ScoringStrategy::Lexical),
            "semantic" | "embedding" => Ok(ScoringStrategy::Semantic),
            other => Err(AppError::Validation(format!(
                "unknown strategy '{other}', expected 'lexical' or 'semantic'"
            ))),
        }
    }
}

/// Implement this to add a scoring backend without touching the pipeline or handlers.
///
/// Must return exactly one score per résumé, in input order.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    fn strategy(&self) -> ScoringStrategy;

    async fn score(&self, job: &Document, resumes: &[Document]) -> Result<Vec<f32>, AppError>;
}
