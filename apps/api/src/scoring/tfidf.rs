//! TF-IDF vectorizer and the lexical similarity scorer built on it.
//!
//! Conventions: lowercase, tokens are runs of two or more word characters,
//! raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1`, L2-normalized rows.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::errors::AppError;
use crate::models::Document;
use crate::scoring::{ScoringStrategy, SimilarityScorer};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// A token's lowercase form and its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub span: Range<usize>,
}

/// Tokens of `text` in order of appearance, with byte offsets into the original text.
pub fn tokenize(text: &str) -> Vec<Token> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| Token {
            term: m.as_str().to_lowercase(),
            span: m.range(),
        })
        .collect()
}

/// L2-normalized sparse document vector keyed by vocabulary index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: HashMap<usize, f64>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.weights.is_empty()
    }

    /// Dot product; equals cosine similarity because both sides are unit length.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (&self.weights, &other.weights)
        } else {
            (&other.weights, &self.weights)
        };
        small
            .iter()
            .filter_map(|(idx, w)| large.get(idx).map(|o| w * o))
            .sum()
    }
}

/// A vocabulary with per-term inverse document frequencies.
#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: HashSet<String> = tokenize(doc.as_ref())
                .into_iter()
                .map(|t| t.term)
                .collect();
            for term in unique {
                *document_frequency.entry(term).or_default() += 1;
            }
        }

        let n = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        // BTreeMap iteration is sorted, so indices follow term order.
        for (idx, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, idx);
        }

        Self { vocabulary, idf }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Projects a document into the fitted space. Out-of-vocabulary terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&token.term) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let mut weights: HashMap<usize, f64> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();

        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return SparseVector::default();
        }
        for w in weights.values_mut() {
            *w /= norm;
        }
        SparseVector { weights }
    }
}

/// Lexical scorer: cosine similarity in a TF-IDF space fitted over the job
/// description and all résumés of the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl TfIdfScorer {
    pub fn score_texts(&self, job: &str, resumes: &[&str]) -> Vec<f32> {
        let mut corpus = Vec::with_capacity(resumes.len() + 1);
        corpus.push(job);
        corpus.extend_from_slice(resumes);

        let vectorizer = TfIdfVectorizer::fit(&corpus);
        let job_vector = vectorizer.transform(job);

        resumes
            .iter()
            .map(|text| {
                let v = vectorizer.transform(text);
                if v.is_zero() || job_vector.is_zero() {
                    0.0
                } else {
                    job_vector.dot(&v).clamp(0.0, 1.0) as f32
                }
            })
            .collect()
    }
}

#[async_trait]
impl SimilarityScorer for TfIdfScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Lexical
    }

    async fn score(&self, job: &Document, resumes: &[Document]) -> Result<Vec<f32>, AppError> {
        let texts: Vec<&str> = resumes.iter().map(|d| d.text.as_str()).collect();
        Ok(self.score_texts(&job.text, &texts))
    }
}
