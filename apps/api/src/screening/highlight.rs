//! Evidence shown next to a ranked résumé.
//!
//! Semantic runs get the résumé lines closest to the job description; lexical
//! runs get the résumé text with job-description terms marked. Everything returned
//! here is HTML-escaped and safe to render as markup.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embedding::{cosine_similarity, embed_blocking, Embedder, EmbeddingError};
use crate::scoring::tfidf::{tokenize, TfIdfVectorizer};
use crate::screening::ranking::compare_desc;

/// Lines shorter than this (after trimming) are not treated as sentences.
pub const MIN_SENTENCE_CHARS: usize = 10;
pub const MAX_EVIDENCE_SENTENCES: usize = 3;

const MARK_OPEN: &str = "<mark>";
const MARK_CLOSE: &str = "</mark>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSentence {
    /// HTML-escaped sentence text.
    pub text: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceHighlights {
    pub name: String,
    pub score: f32,
    pub sentences: Vec<EvidenceSentence>,
    /// Set when evidence could not be computed; the résumé's score still stands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHighlights {
    pub name: String,
    pub score: f32,
    /// Escaped résumé text with matched terms wrapped in `<mark>`.
    pub marked_text: String,
    /// Distinct matched terms, in order of first appearance.
    pub matched_terms: Vec<String>,
}

/// Splits on line breaks and keeps trimmed lines of at least `MIN_SENTENCE_CHARS` characters.
pub fn candidate_sentences(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .map(String::from)
        .collect()
}

/// Indices of the `k` highest similarities, best first, ties in original order, NaN last.
pub fn top_k_indices(similarities: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..similarities.len()).collect();
    indices.sort_by(|&a, &b| compare_desc(similarities[a], similarities[b]));
    indices.truncate(k);
    indices
}

/// The résumé lines most similar to the job description.
/// Returns `None` when the résumé has no usable sentences.
pub async fn closest_sentences(
    embedder: Arc<dyn Embedder>,
    job_text: &str,
    resume_text: &str,
) -> Result<Option<Vec<EvidenceSentence>>, EmbeddingError> {
    let sentences = candidate_sentences(resume_text);
    if sentences.is_empty() {
        return Ok(None);
    }

    let mut texts = Vec::with_capacity(sentences.len() + 1);
    texts.push(job_text.to_string());
    texts.extend(sentences.iter().cloned());

    let embeddings = embed_blocking(embedder, texts).await?;
    let Some((job_embedding, sentence_embeddings)) = embeddings.split_first() else {
        return Ok(None);
    };

    let similarities: Vec<f32> = sentence_embeddings
        .iter()
        .map(|e| cosine_similarity(job_embedding, e))
        .collect();

    let evidence = top_k_indices(&similarities, MAX_EVIDENCE_SENTENCES)
        .into_iter()
        .map(|i| EvidenceSentence {
            text: escape_html(&sentences[i]),
            similarity: similarities[i],
        })
        .collect();
    Ok(Some(evidence))
}

/// Job-description vocabulary, from a vectorizer fitted on the job description alone.
pub fn job_vocabulary(job_text: &str) -> TfIdfVectorizer {
    TfIdfVectorizer::fit(&[job_text])
}

/// Wraps every whole token found in `vocabulary` with `<mark>` tags.
///
/// Matching is token-based (same tokenizer as the vectorizer, case-folded), so a
/// term never matches inside a longer word and matches never overlap.
pub fn mark_keywords(text: &str, vocabulary: &TfIdfVectorizer) -> (String, Vec<String>) {
    let mut marked = String::with_capacity(text.len() + text.len() / 4);
    let mut matched_terms = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = 0;

    for token in tokenize(text) {
        if !vocabulary.contains(&token.term) {
            continue;
        }
        marked.push_str(&escape_html(&text[cursor..token.span.start]));
        marked.push_str(MARK_OPEN);
        marked.push_str(&escape_html(&text[token.span.clone()]));
        marked.push_str(MARK_CLOSE);
        cursor = token.span.end;

        if seen.insert(token.term.clone()) {
            matched_terms.push(token.term);
        }
    }
    marked.push_str(&escape_html(&text[cursor..]));

    (marked, matched_terms)
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
