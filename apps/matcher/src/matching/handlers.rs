//! Axum route handlers for the Matching API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::engine::Threshold;
use crate::matching::pipeline::PipelineSummary;
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::matches::{MatchResult, MatchRow};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchSingleRequest {
    pub job: Job,
    pub candidate: Candidate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub similarity_score: f64,
    pub match_percentage: String,
}

impl From<MatchResult> for MatchResponse {
    fn from(m: MatchResult) -> Self {
        Self {
            job_id: m.job_id,
            candidate_id: m.candidate_id,
            similarity_score: m.score,
            match_percentage: m.percentage(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IdealProfileResponse {
    pub job_id: Uuid,
    pub ideal_profile: String,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PipelineQuery {
    pub threshold: Option<f64>,
    #[serde(default)]
    pub async_mode: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub status: String,
    pub jobs_processed: usize,
    pub candidates_evaluated: usize,
    pub matches_created: usize,
    pub jobs_failed: usize,
}

impl PipelineResponse {
    fn completed(summary: &PipelineSummary) -> Self {
        Self {
            status: "completed".to_string(),
            jobs_processed: summary.jobs_processed,
            candidates_evaluated: summary.candidates_evaluated,
            matches_created: summary.matches_stored,
            jobs_failed: summary.jobs_failed,
        }
    }

    fn started() -> Self {
        Self {
            status: "started".to_string(),
            jobs_processed: 0,
            candidates_evaluated: 0,
            matches_created: 0,
            jobs_failed: 0,
        }
    }
}

fn resolve_threshold(requested: Option<f64>, state: &AppState) -> Result<f64, AppError> {
    let value = requested.unwrap_or(state.config.match_threshold);
    Ok(Threshold::new(value)?.value())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/match/single
///
/// Scores one candidate against one job. No threshold applied.
pub async fn handle_match_single(
    State(state): State<AppState>,
    Json(request): Json<MatchSingleRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let result = state
        .pipeline
        .engine()
        .match_one(&request.job, &request.candidate, None, None)
        .await?;
    Ok(Json(result.into()))
}

/// POST /api/v1/match/job/:job_id?threshold=
///
/// Ranks every stored candidate against a stored job. Nothing is persisted.
pub async fn handle_match_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<ThresholdQuery>,
) -> Result<Json<Vec<MatchResponse>>, AppError> {
    let threshold = resolve_threshold(query.threshold, &state)?;
    let matches = state
        .pipeline
        .match_job(job_id, threshold)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(matches.into_iter().map(MatchResponse::from).collect()))
}

/// POST /api/v1/ideal-profile
pub async fn handle_ideal_profile(
    State(state): State<AppState>,
    Json(job): Json<Job>,
) -> Result<Json<IdealProfileResponse>, AppError> {
    let profile = state.pipeline.engine().generate_profile(&job).await?;
    Ok(Json(IdealProfileResponse {
        job_id: profile.job_id,
        ideal_profile: profile.text,
    }))
}

/// POST /api/v1/pipeline/run?threshold=&async_mode=
///
/// Runs the full pipeline. With `async_mode=true` the run is spawned in the
/// background and the response only confirms it started.
pub async fn handle_run_pipeline(
    State(state): State<AppState>,
    Query(query): Query<PipelineQuery>,
) -> Result<Json<PipelineResponse>, AppError> {
    let threshold = resolve_threshold(query.threshold, &state)?;

    if query.async_mode {
        let pipeline = state.pipeline.clone();
        tokio::spawn(async move {
            match pipeline.run(threshold).await {
                Ok(summary) => info!(
                    "Background pipeline run finished: {} matches stored",
                    summary.matches_stored
                ),
                Err(e) => error!("Background pipeline run failed: {e}"),
            }
        });
        return Ok(Json(PipelineResponse::started()));
    }

    let summary = state.pipeline.run(threshold).await?;
    Ok(Json(PipelineResponse::completed(&summary)))
}

/// GET /api/v1/matches/:job_id/:candidate_id
pub async fn handle_get_match(
    State(state): State<AppState>,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MatchRow>, AppError> {
    let row = state
        .pipeline
        .store()
        .find_match(job_id, candidate_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No match for job {job_id} and candidate {candidate_id}"))
        })?;
    Ok(Json(row))
}
