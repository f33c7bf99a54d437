mod config;
mod db;
mod errors;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matching::cache::{ProfileCache, RedisProfileCache};
use crate::matching::embedding::{EmbeddingService, HttpEmbeddingProvider};
use crate::matching::engine::MatchingEngine;
use crate::matching::pipeline::Pipeline;
use crate::matching::profile::ProfileGenerator;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgMatchStore;

#[derive(Parser)]
#[command(name = "matcher", version, about = "Healthcare job-candidate matching engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the matching HTTP API (default).
    Serve,
    /// Run the matching pipeline once and exit.
    Run {
        /// Similarity threshold for matches (0-1). Defaults to MATCH_THRESHOLD.
        #[arg(long)]
        threshold: Option<f64>,
        /// Show what would be matched without generating or saving anything.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matcher v{}", env!("CARGO_PKG_VERSION"));

    let pipeline = build_pipeline(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pipeline, config).await,
        Command::Run { threshold, dry_run } => {
            if dry_run {
                let dry = pipeline.dry_run().await?;
                info!(
                    "Dry run: would process {} jobs and {} candidates",
                    dry.jobs, dry.candidates
                );
                return Ok(ExitCode::SUCCESS);
            }

            let summary = pipeline
                .run(threshold.unwrap_or(config.match_threshold))
                .await?;
            info!(
                "Results: jobs processed={}, candidates evaluated={}, matches stored={}",
                summary.jobs_processed, summary.candidates_evaluated, summary.matches_stored
            );
            if let Some(avg) = summary.average_score {
                info!("Average match score: {:.2}%", avg * 100.0);
            }
            for failure in &summary.failures {
                warn!("Job {} failed: {}", failure.job_id, failure.error);
            }

            Ok(if summary.matches_stored > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Wires every collaborator once; the embedding service built here is the only
/// instance for the life of the process.
async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    // Record store
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgMatchStore::new(db));

    // Text generator
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    // Embedding provider
    let provider = HttpEmbeddingProvider::new(
        config.embedding_url.clone(),
        config.embedding_model.clone(),
        config.embedding_api_key.clone(),
    )?;
    info!(
        "Embedding provider initialized (model: {}, batch size: {})",
        provider.model(),
        config.embedding_batch_size
    );
    let embeddings = Arc::new(EmbeddingService::new(
        Arc::new(provider),
        config.embedding_prefix.clone(),
        config.embedding_batch_size,
    ));

    // Optional ideal-profile cache
    let cache: Option<Arc<dyn ProfileCache>> = match &config.redis_url {
        Some(url) => match RedisProfileCache::connect(url, config.profile_cache_ttl_secs).await {
            Ok(cache) => {
                info!("Ideal profile cache enabled");
                Some(Arc::new(cache) as Arc<dyn ProfileCache>)
            }
            Err(e) => {
                warn!("Redis unavailable, ideal profile cache disabled: {e}");
                None
            }
        },
        None => None,
    };

    let engine = MatchingEngine::new(ProfileGenerator::new(Arc::new(llm)), embeddings);
    Ok(Pipeline::new(engine, store, cache))
}

async fn serve(pipeline: Pipeline, config: Config) -> Result<ExitCode> {
    let port = config.port;
    let state = AppState { pipeline, config };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(ExitCode::SUCCESS)
}
