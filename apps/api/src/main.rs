mod config;
mod embedding;
mod errors;
mod extraction;
mod models;
mod report;
mod routes;
mod scoring;
mod screening;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::report::email::SmtpMailer;
use crate::routes::build_router;
use crate::scoring::SemanticScorer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Load the sentence-embedding model once; every request shares it
    let semantic_scorer = load_semantic_scorer(&config).await;

    if config.email.credentials().is_err() {
        info!("Email credentials not configured; email delivery will report an error");
    }
    let mailer = Arc::new(SmtpMailer::new(config.email.clone()));

    let state = AppState::new(config.clone(), semantic_scorer, mailer);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Loads the embedding model. A failure disables semantic scoring instead of
/// stopping the service; lexical scoring needs no model.
#[cfg(feature = "candle")]
async fn load_semantic_scorer(config: &Config) -> Option<SemanticScorer> {
    use crate::embedding::bert::BertEmbedder;

    let repo_id = config.embedding_model.clone();
    info!("Loading embedding model {repo_id}...");
    match tokio::task::spawn_blocking(move || BertEmbedder::load(&repo_id)).await {
        Ok(Ok(embedder)) => Some(SemanticScorer::new(Arc::new(embedder))),
        Ok(Err(e)) => {
            tracing::warn!("Semantic scoring disabled: {e}");
            None
        }
        Err(e) => {
            tracing::warn!("Semantic scoring disabled: model loader panicked: {e}");
            None
        }
    }
}

#[cfg(not(feature = "candle"))]
async fn load_semantic_scorer(_config: &Config) -> Option<SemanticScorer> {
    info!("Built without the `candle` feature; semantic scoring disabled");
    None
}
