//! Screening pipeline: extract → score → rank/filter → highlight → export (→ email).
//!
//! One linear pass per request. Per-document and email failures are recorded in
//! the response; only invalid input or a scorer failure aborts the run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{extract_all, extract_document, ExtractionIssue, Upload};
use crate::models::{Document, RankedResult, ScoreRecord};
use crate::report::csv_export::{build_export, render_csv, CsvExport};
use crate::scoring::{ScoringStrategy, SemanticScorer, SimilarityScorer};
use crate::screening::highlight::{
    closest_sentences, job_vocabulary, mark_keywords, KeywordHighlights, SentenceHighlights,
};
use crate::screening::ranking::{rank, select_top, ScreeningOptions};
use crate::state::AppState;

pub const MISSING_INPUT_NOTICE: &str =
    "Please provide a job description and upload resumes to start ranking.";

/// How the job description was supplied.
#[derive(Debug, Clone)]
pub enum JobDescriptionInput {
    Text(String),
    File(Upload),
}

#[derive(Debug, Clone)]
pub struct ScreeningInput {
    pub job_description: Option<JobDescriptionInput>,
    pub resumes: Vec<Upload>,
    pub strategy: ScoringStrategy,
    pub options: ScreeningOptions,
    pub email_to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStatus {
    Completed,
    AwaitingInput,
}

/// Extraction summary for one uploaded file.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub name: String,
    pub char_count: usize,
    pub issues: Vec<ExtractionIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailOutcome {
    pub recipient: String,
    pub delivered: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningResponse {
    pub screening_id: Uuid,
    pub status: ScreeningStatus,
    pub notice: Option<String>,
    pub strategy: ScoringStrategy,
    pub options: ScreeningOptions,
    pub job_description: Option<DocumentReport>,
    pub documents: Vec<DocumentReport>,
    /// Every résumé, ranked ("view all").
    pub all_results: RankedResult,
    /// Threshold-filtered, top-N cut of `all_results`.
    pub top_results: Vec<ScoreRecord>,
    pub sentence_highlights: Vec<SentenceHighlights>,
    pub keyword_highlights: Vec<KeywordHighlights>,
    pub export: Option<CsvExport>,
    pub email: Option<EmailOutcome>,
    pub generated_at: DateTime<Utc>,
}

impl ScreeningResponse {
    fn awaiting_input(
        strategy: ScoringStrategy,
        options: ScreeningOptions,
        job_description: Option<DocumentReport>,
    ) -> Self {
        Self {
            screening_id: Uuid::new_v4(),
            status: ScreeningStatus::AwaitingInput,
            notice: Some(MISSING_INPUT_NOTICE.to_string()),
            strategy,
            options,
            job_description,
            documents: vec![],
            all_results: RankedResult::default(),
            top_results: vec![],
            sentence_highlights: vec![],
            keyword_highlights: vec![],
            export: None,
            email: None,
            generated_at: Utc::now(),
        }
    }
}

/// Runs one screening pass.
pub async fn run_screening(
    state: &AppState,
    input: ScreeningInput,
) -> Result<ScreeningResponse, AppError> {
    input.options.validate()?;
    if input.email_to.is_some() && input.strategy != ScoringStrategy::Lexical {
        return Err(AppError::Validation(
            "email delivery is only available for lexical screenings".to_string(),
        ));
    }

    let (job, job_report) = match input.job_description {
        Some(JobDescriptionInput::Text(text)) => (Document::new("job_description", text.trim()), None),
        Some(JobDescriptionInput::File(upload)) => {
            let outcome = extract_document(upload).await;
            let report = DocumentReport {
                name: outcome.document.name.clone(),
                char_count: outcome.char_count,
                issues: outcome.issues,
            };
            (outcome.document, Some(report))
        }
        None => (Document::empty("job_description"), None),
    };

    if job.text.trim().is_empty() || input.resumes.is_empty() {
        info!("Screening not started: missing job description or résumés");
        return Ok(ScreeningResponse::awaiting_input(
            input.strategy,
            input.options,
            job_report,
        ));
    }

    let scorer: &dyn SimilarityScorer = match input.strategy {
        ScoringStrategy::Lexical => state.lexical_scorer.as_ref(),
        ScoringStrategy::Semantic => semantic_scorer(state)?,
    };

    let outcomes = extract_all(input.resumes).await;
    let mut documents = Vec::with_capacity(outcomes.len());
    let mut resumes = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        documents.push(DocumentReport {
            name: outcome.document.name.clone(),
            char_count: outcome.char_count,
            issues: outcome.issues,
        });
        resumes.push(outcome.document);
    }

    info!(
        "Scoring {} résumés with {} strategy",
        resumes.len(),
        scorer.strategy()
    );
    let scores = scorer.score(&job, &resumes).await?;
    let all_results = rank(&resumes, &scores)?;
    let top_results = select_top(&all_results, &input.options);
    debug!(
        "Ranked {} résumés, {} selected (threshold {}, top {})",
        all_results.len(),
        top_results.len(),
        input.options.threshold,
        input.options.top_n
    );

    let mut sentence_highlights = Vec::new();
    let mut keyword_highlights = Vec::new();
    match input.strategy {
        ScoringStrategy::Semantic => {
            let embedder = semantic_scorer(state)?.embedder();
            for record in &top_results {
                let resume = &resumes[record.position];
                match closest_sentences(embedder.clone(), &job.text, &resume.text).await {
                    Ok(Some(sentences)) => sentence_highlights.push(SentenceHighlights {
                        name: record.name.clone(),
                        score: record.score,
                        sentences,
                        error: None,
                    }),
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Sentence evidence for {} failed: {e}", record.name);
                        sentence_highlights.push(SentenceHighlights {
                            name: record.name.clone(),
                            score: record.score,
                            sentences: vec![],
                            error: Some(e.to_string()),
                        });
                    }
                }
            }
        }
        ScoringStrategy::Lexical => {
            let vocabulary = job_vocabulary(&job.text);
            for record in &top_results {
                let (marked_text, matched_terms) =
                    mark_keywords(&resumes[record.position].text, &vocabulary);
                keyword_highlights.push(KeywordHighlights {
                    name: record.name.clone(),
                    score: record.score,
                    marked_text,
                    matched_terms,
                });
            }
        }
    }

    let export = build_export(&all_results, input.strategy)?;

    let email = match input.email_to {
        Some(recipient) => Some(send_email(state, recipient, &all_results, input.strategy).await),
        None => None,
    };

    Ok(ScreeningResponse {
        screening_id: Uuid::new_v4(),
        status: ScreeningStatus::Completed,
        notice: None,
        strategy: input.strategy,
        options: input.options,
        job_description: job_report,
        documents,
        all_results,
        top_results,
        sentence_highlights,
        keyword_highlights,
        export: Some(export),
        email,
        generated_at: Utc::now(),
    })
}

fn semantic_scorer(state: &AppState) -> Result<&SemanticScorer, AppError> {
    state.semantic_scorer.as_ref().ok_or_else(|| {
        AppError::Unavailable("semantic scoring is unavailable: embedding model not loaded".into())
    })
}

/// Sends the CSV once. A failure is returned as an outcome, not an error, so the
/// ranking already computed still reaches the user.
async fn send_email(
    state: &AppState,
    recipient: String,
    ranked: &RankedResult,
    strategy: ScoringStrategy,
) -> EmailOutcome {
    let result = match render_csv(&ranked.records, strategy) {
        Ok(csv) => state
            .mailer
            .send_results(&recipient, &csv)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match result {
        Ok(()) => EmailOutcome {
            recipient,
            delivered: true,
            error: None,
        },
        Err(error) => {
            warn!("Email to {recipient} failed: {error}");
            EmailOutcome {
                recipient,
                delivered: false,
                error: Some(error),
            }
        }
    }
}
