use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::models::{RankedResult, ScoreRecord};
use crate::scoring::ScoringStrategy;

pub const EXPORT_FILENAME: &str = "results.csv";
const NAME_COLUMN: &str = "Resume";

/// A CSV ranking ready for inline download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvExport {
    pub filename: String,
    /// `data:text/csv;base64,...`
    pub data_uri: String,
}

/// Renders the full ranking as CSV, one row per résumé in ranked order.
pub fn render_csv(records: &[ScoreRecord], strategy: ScoringStrategy) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record([NAME_COLUMN, strategy.score_column()])?;
    for record in records {
        let score = record.score.to_string();
        writer.write_record([record.name.as_str(), score.as_str()])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV writer: {e}"))?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

pub fn to_data_uri(csv: &str) -> String {
    format!("data:text/csv;base64,{}", STANDARD.encode(csv.as_bytes()))
}

pub fn build_export(ranked: &RankedResult, strategy: ScoringStrategy) -> Result<CsvExport> {
    let csv = render_csv(&ranked.records, strategy)?;
    Ok(CsvExport {
        filename: EXPORT_FILENAME.to_string(),
        data_uri: to_data_uri(&csv),
    })
}

/// Parses an exported CSV back into (name, score) records. Positions are
/// reassigned from row order.
#[cfg(test)]
pub fn parse_csv_export(csv: &str) -> Result<Vec<ScoreRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.get(0) != Some(NAME_COLUMN) {
        anyhow::bail!("unexpected CSV header: {headers:?}");
    }

    reader
        .records()
        .enumerate()
        .map(|(position, row)| {
            let row = row?;
            let name = row.get(0).context("missing résumé column")?.to_string();
            let score = row
                .get(1)
                .context("missing score column")?
                .parse::<f32>()
                .with_context(|| format!("invalid score in row {}", position + 1))?;
            Ok(ScoreRecord {
                name,
                score,
                position,
            })
        })
        .collect()
}

/// Decodes a `data:text/csv;base64,` URI produced by `to_data_uri`.
#[cfg(test)]
pub fn decode_data_uri(uri: &str) -> Result<String> {
    let encoded = uri
        .strip_prefix("data:text/csv;base64,")
        .context("not a base64 CSV data URI")?;
    let bytes = STANDARD.decode(encoded)?;
    String::from_utf8(bytes).context("decoded CSV was not UTF-8")
}
