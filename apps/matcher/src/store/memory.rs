//! In-memory `MatchStore` for tests. Mirrors the Postgres upsert semantics.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::MatchError;
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::matches::{MatchResult, MatchRow, UpsertOutcome};
use crate::store::MatchStore;

#[derive(Default)]
pub struct MemoryStore {
    pub jobs: Vec<Job>,
    pub candidates: Vec<Candidate>,
    rows: Mutex<Vec<MatchRow>>,
    writes: Mutex<usize>,
    /// When set, every upsert fails.
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new(jobs: Vec<Job>, candidates: Vec<Candidate>) -> Self {
        Self {
            jobs,
            candidates,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> Vec<MatchRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub fn rows_for(&self, job_id: Uuid, candidate_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.job_id == job_id && r.user_id == candidate_id)
            .count()
    }

    /// Flags a stored row as contacted, so tests can check updates leave it alone.
    pub fn mark_questionnaire_sent(&self, job_id: Uuid, candidate_id: Uuid) {
        for row in self.rows.lock().unwrap().iter_mut() {
            if row.job_id == job_id && row.user_id == candidate_id {
                row.questionnaire_sent = true;
            }
        }
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn fetch_jobs(&self) -> Result<Vec<Job>, MatchError> {
        Ok(self.jobs.clone())
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<Job>, MatchError> {
        Ok(self.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, MatchError> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| c.has_resume())
            .cloned()
            .collect())
    }

    async fn find_match(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<MatchRow>, MatchError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.job_id == job_id && r.user_id == candidate_id)
            .cloned())
    }

    async fn upsert_match(&self, result: &MatchResult) -> Result<UpsertOutcome, MatchError> {
        if self.fail_writes {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        *self.writes.lock().unwrap() += 1;

        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.job_id == result.job_id && r.user_id == result.candidate_id)
        {
            row.similarity_score = result.score;
            row.updated_at = now;
            return Ok(UpsertOutcome::Updated);
        }

        rows.push(MatchRow {
            match_id: Uuid::new_v4(),
            job_id: result.job_id,
            user_id: result.candidate_id,
            similarity_score: result.score,
            questionnaire_sent: false,
            match_failed: false,
            created_at: now,
            updated_at: now,
        });
        Ok(UpsertOutcome::Inserted)
    }
}
