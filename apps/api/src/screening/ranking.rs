//! Ranker/Filter — orders score records and applies the threshold and top-N cap.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Document, RankedResult, ScoreRecord};

pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_TOP_N: usize = 5;

/// User-tunable selection knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreeningOptions {
    pub threshold: f32,
    pub top_n: usize,
}

impl Default for ScreeningOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ScreeningOptions {
    /// Thresholds above 1 are allowed and simply select nothing.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(AppError::Validation(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if self.top_n == 0 {
            return Err(AppError::Validation("top_n must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Pairs each résumé with its score and sorts descending.
///
/// `sort_by` is stable, so equal scores keep upload order. NaN sorts last.
pub fn rank(resumes: &[Document], scores: &[f32]) -> Result<RankedResult, AppError> {
    if resumes.len() != scores.len() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "scorer returned {} scores for {} résumés",
            scores.len(),
            resumes.len()
        )));
    }

    let mut records: Vec<ScoreRecord> = resumes
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(position, (doc, &score))| ScoreRecord {
            name: doc.name.clone(),
            score,
            position,
        })
        .collect();

    records.sort_by(|a, b| compare_desc(a.score, b.score));
    Ok(RankedResult { records })
}

/// Descending order for scores, with NaN after every number.
pub fn compare_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Records at or above the threshold, in ranked order.
pub fn filter_by_threshold(ranked: &RankedResult, threshold: f32) -> Vec<ScoreRecord> {
    ranked
        .iter()
        .filter(|r| r.score >= threshold)
        .cloned()
        .collect()
}

/// Threshold filter followed by the top-N cap.
pub fn select_top(ranked: &RankedResult, options: &ScreeningOptions) -> Vec<ScoreRecord> {
    let mut selected = filter_by_threshold(ranked, options.threshold);
    selected.truncate(options.top_n);
    selected
}
