use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::models::required;

/// A job seeker. Only candidates with resume text take part in matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub resume_text: String,
    #[serde(default)]
    pub preferences: Option<Value>,
}

impl Candidate {
    pub fn has_resume(&self) -> bool {
        !self.resume_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub resume_text: Option<String>,
    pub preferences: Option<Value>,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = ValidationError;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        let id = row.user_id;
        Ok(Candidate {
            id,
            name: required(row.name, "candidate", id, "name")?,
            email: required(row.email, "candidate", id, "email")?,
            resume_text: required(row.resume_text, "candidate", id, "resume_text")?,
            preferences: row.preferences,
        })
    }
}

#[cfg(test)]
pub(crate) fn candidate(name: &str, resume: &str) -> Candidate {
    Candidate {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        resume_text: resume.to_string(),
        preferences: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_keeps_optional_preferences() {
        let row = CandidateRow {
            user_id: Uuid::new_v4(),
            name: Some("Jane Smith".to_string()),
            email: Some("jane@example.com".to_string()),
            resume_text: Some("RN, BSN".to_string()),
            preferences: Some(json!({"shift": "nights"})),
        };
        let c = Candidate::try_from(row).unwrap();
        assert_eq!(c.preferences.unwrap()["shift"], "nights");
    }

    #[test]
    fn test_row_without_email_fails() {
        let row = CandidateRow {
            user_id: Uuid::new_v4(),
            name: Some("Jane Smith".to_string()),
            email: None,
            resume_text: Some("RN".to_string()),
            preferences: None,
        };
        assert!(matches!(
            Candidate::try_from(row).unwrap_err(),
            ValidationError::MissingField { field: "email", .. }
        ));
    }

    #[test]
    fn test_whitespace_resume_does_not_count() {
        assert!(!candidate("Sam Lee", "  \n ").has_resume());
        assert!(candidate("Sam Lee", "LPN").has_resume());
    }
}
