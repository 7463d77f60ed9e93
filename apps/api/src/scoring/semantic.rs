use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::embedding::{cosine_similarity, embed_blocking, Embedder};
use crate::errors::AppError;
use crate::models::Document;
use crate::scoring::{ScoringStrategy, SimilarityScorer};

/// Semantic scorer: cosine similarity between sentence embeddings of the job
/// description and each résumé. Scores fall in [-1, 1].
#[derive(Clone)]
pub struct SemanticScorer {
    embedder: Arc<dyn Embedder>,
}

impl SemanticScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }
}

#[async_trait]
impl SimilarityScorer for SemanticScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Semantic
    }

    async fn score(&self, job: &Document, resumes: &[Document]) -> Result<Vec<f32>, AppError> {
        let mut texts = Vec::with_capacity(resumes.len() + 1);
        texts.push(job.text.clone());
        texts.extend(resumes.iter().map(|d| d.text.clone()));

        let embeddings = embed_blocking(self.embedder(), texts).await?;
        let Some((job_embedding, resume_embeddings)) = embeddings.split_first() else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "embedder returned no vectors"
            )));
        };
        if resume_embeddings.len() != resumes.len() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "embedder returned {} vectors for {} résumés",
                resume_embeddings.len(),
                resumes.len()
            )));
        }

        debug!("Embedded {} résumés", resume_embeddings.len());
        Ok(resume_embeddings
            .iter()
            .map(|e| cosine_similarity(job_embedding, e))
            .collect())
    }
}
