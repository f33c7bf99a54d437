//! Pipeline Orchestrator — every job against the shared candidate pool, then
//! idempotent persistence of all retained matches.
//!
//! A generation or embedding failure aborts only the job it happened in; the run
//! carries on and reports the failure. Store failures abort the run.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::MatchError;
use crate::matching::cache::ProfileCache;
use crate::matching::engine::{JobMatches, MatchingEngine, Threshold};
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::matches::{MatchResult, UpsertOutcome};
use crate::store::MatchStore;

/// A job whose matching failed during a run.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub job_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub jobs_processed: usize,
    pub candidates_evaluated: usize,
    /// Matches created or updated.
    pub matches_stored: usize,
    pub matches_created: usize,
    pub matches_updated: usize,
    pub jobs_failed: usize,
    pub failures: Vec<JobFailure>,
    pub average_score: Option<f64>,
}

/// What a run would touch, without generating or writing anything.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunSummary {
    pub jobs: usize,
    pub candidates: usize,
}

#[derive(Clone)]
pub struct Pipeline {
    engine: MatchingEngine,
    store: Arc<dyn MatchStore>,
    cache: Option<Arc<dyn ProfileCache>>,
}

impl Pipeline {
    pub fn new(
        engine: MatchingEngine,
        store: Arc<dyn MatchStore>,
        cache: Option<Arc<dyn ProfileCache>>,
    ) -> Self {
        Self {
            engine,
            store,
            cache,
        }
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn MatchStore> {
        &self.store
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Runs matching for every job and upserts all retained matches.
    pub async fn run(&self, threshold: f64) -> Result<PipelineSummary, MatchError> {
        let threshold = Threshold::new(threshold)?;
        info!("Matching pipeline started (threshold {:.2})", threshold.value());

        let jobs = self.store.fetch_jobs().await?;
        info!("Found {} jobs", jobs.len());
        let candidates = self.store.fetch_candidates().await?;
        info!("Found {} candidates with resumes", candidates.len());

        if jobs.is_empty() || candidates.is_empty() {
            info!("No jobs or candidates found, nothing to match");
            return Ok(PipelineSummary::default());
        }

        let mut summary = PipelineSummary {
            jobs_processed: jobs.len(),
            candidates_evaluated: candidates.len(),
            ..Default::default()
        };

        let mut all_matches: Vec<MatchResult> = Vec::new();
        for job in &jobs {
            match self.match_with_cache(job, &candidates, threshold).await {
                Ok(job_matches) => {
                    debug!(
                        "Job {}: {} of {} candidates retained",
                        job.id,
                        job_matches.matches.len(),
                        job_matches.evaluated
                    );
                    all_matches.extend(job_matches.matches);
                }
                Err(e) => {
                    warn!("Matching failed for job {} ({}): {e}", job.id, job.title);
                    summary.failures.push(JobFailure {
                        job_id: job.id,
                        error: e.to_string(),
                    });
                }
            }
        }
        summary.jobs_failed = summary.failures.len();

        info!("Saving {} matches", all_matches.len());
        for m in &all_matches {
            match self.store.upsert_match(m).await? {
                UpsertOutcome::Inserted => summary.matches_created += 1,
                UpsertOutcome::Updated => summary.matches_updated += 1,
            }
        }
        summary.matches_stored = all_matches.len();

        if !all_matches.is_empty() {
            let total: f64 = all_matches.iter().map(|m| m.score).sum();
            summary.average_score = Some(total / all_matches.len() as f64);
        }

        info!(
            "Matching complete: jobs={} (failed {}), candidates={}, matches={} (created {}, updated {})",
            summary.jobs_processed,
            summary.jobs_failed,
            summary.candidates_evaluated,
            summary.matches_stored,
            summary.matches_created,
            summary.matches_updated
        );
        Ok(summary)
    }

    pub async fn dry_run(&self) -> Result<DryRunSummary, MatchError> {
        let jobs = self.store.fetch_jobs().await?;
        let candidates = self.store.fetch_candidates().await?;
        info!(
            "Dry run: would process {} jobs and {} candidates",
            jobs.len(),
            candidates.len()
        );
        Ok(DryRunSummary {
            jobs: jobs.len(),
            candidates: candidates.len(),
        })
    }

    /// Ranks all stored candidates for one stored job without persisting.
    /// `None` when the job does not exist; no generation when there are no candidates.
    pub async fn match_job(
        &self,
        job_id: Uuid,
        threshold: f64,
    ) -> Result<Option<Vec<MatchResult>>, MatchError> {
        let threshold = Threshold::new(threshold)?;
        let Some(job) = self.store.find_job(job_id).await? else {
            return Ok(None);
        };
        let candidates = self.store.fetch_candidates().await?;
        if candidates.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let job_matches = self.match_with_cache(&job, &candidates, threshold).await?;
        Ok(Some(job_matches.matches))
    }

    async fn match_with_cache(
        &self,
        job: &Job,
        candidates: &[Candidate],
        threshold: Threshold,
    ) -> Result<JobMatches, MatchError> {
        let cached = match &self.cache {
            Some(cache) => cache.get(job).await,
            None => None,
        };
        let was_cached = cached.is_some();

        let job_matches = self
            .engine
            .match_all_with_profile(job, candidates, threshold, cached)
            .await?;

        if let (Some(cache), false) = (&self.cache, was_cached) {
            cache.put(job, &job_matches.profile).await;
        }
        Ok(job_matches)
    }
}
