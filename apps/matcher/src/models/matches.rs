use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Score of one candidate against one job's ideal profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    /// In [0, 1].
    pub score: f64,
}

impl MatchResult {
    /// `0.734` → `"73.4%"`.
    pub fn percentage(&self) -> String {
        format!("{:.1}%", self.score * 100.0)
    }
}

/// Persisted `matches` row. Unique on `(job_id, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRow {
    pub match_id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub similarity_score: f64,
    pub questionnaire_sent: bool,
    pub match_failed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether an upsert created a new row or rewrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
