//! Axum route handlers for the Screening API.

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::extraction::Upload;
use crate::models::ScoreRecord;
use crate::report::csv_export::render_csv;
use crate::scoring::ScoringStrategy;
use crate::screening::pipeline::{
    run_screening, JobDescriptionInput, ScreeningInput, ScreeningResponse,
};
use crate::screening::ranking::ScreeningOptions;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EmailResultsRequest {
    pub recipient: String,
    pub results: Vec<ScoreRecord>,
    #[serde(default)]
    pub strategy: ScoringStrategy,
}

#[derive(Debug, Serialize)]
pub struct EmailResultsResponse {
    pub recipient: String,
    pub delivered: bool,
}

/// Which job-description field the client intends to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMethod {
    Text,
    Upload,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screenings
///
/// Multipart form: `job_description` or `job_description_file`, repeated `resumes`,
/// optional `input_method`, `strategy`, `threshold`, `top_n`, `email_to`.
pub async fn handle_screen(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScreeningResponse>, AppError> {
    let input = read_screening_form(multipart, &state).await?;
    let response = run_screening(&state, input).await?;
    Ok(Json(response))
}

/// POST /api/v1/screenings/email
///
/// Emails a ranking the client already holds as a CSV attachment. Not retried.
pub async fn handle_email_results(
    State(state): State<AppState>,
    Json(request): Json<EmailResultsRequest>,
) -> Result<Json<EmailResultsResponse>, AppError> {
    if request.recipient.trim().is_empty() {
        return Err(AppError::Validation("recipient cannot be empty".to_string()));
    }
    if request.strategy != ScoringStrategy::Lexical {
        return Err(AppError::Validation(
            "email delivery is only available for lexical screenings".to_string(),
        ));
    }

    let csv = render_csv(&request.results, request.strategy)?;
    state.mailer.send_results(&request.recipient, &csv).await?;

    Ok(Json(EmailResultsResponse {
        recipient: request.recipient,
        delivered: true,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Form parsing
// ────────────────────────────────────────────────────────────────────────────

async fn read_screening_form(
    mut multipart: Multipart,
    state: &AppState,
) -> Result<ScreeningInput, AppError> {
    let mut input_method = None;
    let mut jd_text: Option<String> = None;
    let mut jd_file: Option<Upload> = None;
    let mut resumes = Vec::new();
    let mut strategy = ScoringStrategy::default();
    let mut options = ScreeningOptions {
        threshold: state.config.default_threshold,
        top_n: state.config.default_top_n,
    };
    let mut email_to = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => jd_text = non_blank(read_text(field).await?),
            "job_description_file" => jd_file = read_upload(field).await?,
            "resumes" | "resumes[]" => {
                if let Some(upload) = read_upload(field).await? {
                    resumes.push(upload);
                }
            }
            "input_method" => input_method = Some(parse_input_method(&read_text(field).await?)?),
            "strategy" => strategy = read_text(field).await?.parse()?,
            "threshold" => options.threshold = parse_field(&name, &read_text(field).await?)?,
            "top_n" => options.top_n = parse_field(&name, &read_text(field).await?)?,
            "email_to" => email_to = non_blank(read_text(field).await?),
            other => debug!("Ignoring unknown form field '{other}'"),
        }
    }

    let job_description = match input_method {
        Some(InputMethod::Text) => jd_text.map(JobDescriptionInput::Text),
        Some(InputMethod::Upload) => jd_file.map(JobDescriptionInput::File),
        None => jd_text
            .map(JobDescriptionInput::Text)
            .or(jd_file.map(JobDescriptionInput::File)),
    };

    Ok(ScreeningInput {
        job_description,
        resumes,
        strategy,
        options,
        email_to,
    })
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("unreadable form field: {e}")))
}

/// Reads a file part. Browsers send an empty part for an untouched file input;
/// that is treated as no file.
async fn read_upload(field: Field<'_>) -> Result<Option<Upload>, AppError> {
    let name = field
        .file_name()
        .map(str::to_string)
        .filter(|n| !n.is_empty());
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("unreadable upload: {e}")))?;

    match name {
        None if bytes.is_empty() => Ok(None),
        name => Ok(Some(Upload {
            name: name.unwrap_or_else(|| "unnamed".to_string()),
            content_type,
            bytes,
        })),
    }
}

fn parse_input_method(raw: &str) -> Result<InputMethod, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "text" | "type manually" => Ok(InputMethod::Text),
        "upload" | "pdf" | "upload pdf" | "file" => Ok(InputMethod::Upload),
        other => Err(AppError::Validation(format!(
            "unknown input_method '{other}', expected 'text' or 'upload'"
        ))),
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid value for {name}: '{raw}'")))
}

fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}
