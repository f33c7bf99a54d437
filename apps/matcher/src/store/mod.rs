//! Record store seam: jobs and candidates in, match rows out.
//!
//! The matching core only sees typed domain values; row decoding and
//! required-field validation happen inside each implementation.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::MatchError;
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::matches::{MatchResult, MatchRow, UpsertOutcome};

#[derive(Debug, Error)]
#[error("database error: {0}")]
pub struct PersistenceError(#[from] pub sqlx::Error);

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, MatchError>;

    async fn find_job(&self, job_id: Uuid) -> Result<Option<Job>, MatchError>;

    /// Only candidates with non-blank resume text.
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, MatchError>;

    async fn find_match(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<MatchRow>, MatchError>;

    /// Insert-or-update keyed by `(job_id, candidate_id)`. Updates overwrite the score
    /// and bump `updated_at`; inserts start with workflow flags cleared.
    async fn upsert_match(&self, result: &MatchResult) -> Result<UpsertOutcome, MatchError>;
}

impl From<sqlx::Error> for MatchError {
    fn from(e: sqlx::Error) -> Self {
        MatchError::Persistence(PersistenceError(e))
    }
}
