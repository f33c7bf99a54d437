use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::MatchError;
use crate::models::candidate::{Candidate, CandidateRow};
use crate::models::job::{Job, JobRow};
use crate::models::matches::{MatchResult, MatchRow, UpsertOutcome};
use crate::store::MatchStore;

const JOB_COLUMNS: &str = "job_id, job_name, company_name, city, state, \
    hourly_wage_minimum, hourly_wage_maximum, job_description, job_requirements";

/// Postgres-backed record store (`jobs`, `u_candidates`, `matches`).
#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, MatchError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at, job_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Job::try_from(row).map_err(MatchError::from))
            .collect()
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<Job>, MatchError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = $1"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Job::try_from).transpose()?)
    }

    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, MatchError> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT user_id, name, email, resume_text, preferences
            FROM u_candidates
            WHERE resume_text IS NOT NULL AND btrim(resume_text) <> ''
            ORDER BY created_at, user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let candidate = Candidate::try_from(row)?;
            if candidate.has_resume() {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    async fn find_match(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<MatchRow>, MatchError> {
        Ok(sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT match_id, job_id, user_id, similarity_score,
                   questionnaire_sent, match_failed, created_at, updated_at
            FROM matches
            WHERE job_id = $1 AND user_id = $2
            "#,
        )
        .bind(job_id)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Single statement against the `(job_id, user_id)` unique constraint, so
    /// concurrent writers cannot produce duplicate rows.
    async fn upsert_match(&self, result: &MatchResult) -> Result<UpsertOutcome, MatchError> {
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO matches
                (job_id, user_id, similarity_score, questionnaire_sent, match_failed)
            VALUES ($1, $2, $3, FALSE, FALSE)
            ON CONFLICT (job_id, user_id) DO UPDATE
                SET similarity_score = EXCLUDED.similarity_score,
                    updated_at = now()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(result.job_id)
        .bind(result.candidate_id)
        .bind(result.score)
        .fetch_one(&self.pool)
        .await?;

        let outcome = if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        };
        debug!(
            "Match {}/{} {:?} (score {:.4})",
            result.job_id, result.candidate_id, outcome, result.score
        );
        Ok(outcome)
    }
}
