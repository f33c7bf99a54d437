use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::models::required;

/// Namespace for job content fingerprints (ideal-profile cache keys).
const JOB_FINGERPRINT_NAMESPACE: Uuid = Uuid::from_u128(0x6a0b_31d2_8f4e_4c1a_9b57_2e8d_d4f0_13c7);

/// A healthcare job posting, immutable for the duration of a matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub employer: String,
    pub city: String,
    pub state: String,
    pub wage_min: f64,
    pub wage_max: f64,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
}

impl Job {
    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }

    /// Wage band must be finite, non-negative and ordered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let ok = self.wage_min.is_finite()
            && self.wage_max.is_finite()
            && self.wage_min >= 0.0
            && self.wage_min <= self.wage_max;
        if ok {
            Ok(())
        } else {
            Err(ValidationError::WageBand {
                job_id: self.id,
                min: self.wage_min,
                max: self.wage_max,
            })
        }
    }

    /// Stable content hash: changes whenever any field that feeds the profile prompt changes.
    pub fn fingerprint(&self) -> Uuid {
        // Serializing a plain struct of strings and floats cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        Uuid::new_v5(&JOB_FINGERPRINT_NAMESPACE, &bytes)
    }
}

/// Raw `jobs` row. Every column except the key is nullable at the database level;
/// description and requirements may stay NULL, the rest are required.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub job_id: Uuid,
    pub job_name: Option<String>,
    pub company_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub hourly_wage_minimum: Option<f64>,
    pub hourly_wage_maximum: Option<f64>,
    pub job_description: Option<String>,
    pub job_requirements: Option<Vec<String>>,
}

impl TryFrom<JobRow> for Job {
    type Error = ValidationError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let id = row.job_id;
        let job = Job {
            id,
            title: required(row.job_name, "job", id, "job_name")?,
            employer: required(row.company_name, "job", id, "company_name")?,
            city: required(row.city, "job", id, "city")?,
            state: required(row.state, "job", id, "state")?,
            wage_min: required(row.hourly_wage_minimum, "job", id, "hourly_wage_minimum")?,
            wage_max: required(row.hourly_wage_maximum, "job", id, "hourly_wage_maximum")?,
            // Blank text is tolerated; the profile prompt falls back to generic wording.
            description: row.job_description.unwrap_or_default(),
            requirements: row.job_requirements.unwrap_or_default(),
        };
        job.validate()?;
        Ok(job)
    }
}

#[cfg(test)]
pub(crate) fn icu_rn_job() -> Job {
    Job {
        id: Uuid::new_v4(),
        title: "Registered Nurse - ICU".to_string(),
        employer: "City General Hospital".to_string(),
        city: "New York".to_string(),
        state: "NY".to_string(),
        wage_min: 36.0,
        wage_max: 46.0,
        description: "We are seeking a compassionate and skilled Registered Nurse to join our Intensive Care Unit.".to_string(),
        requirements: vec![
            "Active RN license".to_string(),
            "2+ years ICU experience".to_string(),
        ],
    }
}
