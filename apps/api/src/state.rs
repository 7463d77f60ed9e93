use std::sync::Arc;

use crate::config::Config;
use crate::report::email::ResultMailer;
use crate::scoring::{SemanticScorer, SimilarityScorer, TfIdfScorer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub lexical_scorer: Arc<dyn SimilarityScorer>,
    /// `None` when the embedding model is unavailable; semantic runs then return 503.
    pub semantic_scorer: Option<SemanticScorer>,
    pub mailer: Arc<dyn ResultMailer>,
}

impl AppState {
    pub fn new(
        config: Config,
        semantic_scorer: Option<SemanticScorer>,
        mailer: Arc<dyn ResultMailer>,
    ) -> Self {
        Self {
            config,
            lexical_scorer: Arc::new(TfIdfScorer),
            semantic_scorer,
            mailer,
        }
    }
}
