//! Profile Generator — asks the text generator for a resume-like description of the
//! ideal candidate for one job. That text is the anchor every resume is scored against.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::llm_client::{GenerationError, TextGenerator};
use crate::matching::prompts::{
    IDEAL_PROFILE_PROMPT_TEMPLATE, IDEAL_PROFILE_SYSTEM, MISSING_DESCRIPTION,
    MISSING_REQUIREMENTS,
};
use crate::models::job::Job;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;

/// Generated ideal-candidate text, tied to exactly one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealProfile {
    pub job_id: Uuid,
    pub text: String,
}

#[derive(Clone)]
pub struct ProfileGenerator {
    llm: Arc<dyn TextGenerator>,
}

impl ProfileGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// One text-generation call. Empty job text is allowed and yields a generic
    /// profile; an empty completion is an error, never an empty profile.
    pub async fn generate(&self, job: &Job) -> Result<IdealProfile, GenerationError> {
        let prompt = build_profile_prompt(job);
        let text = self
            .llm
            .generate(&prompt, Some(IDEAL_PROFILE_SYSTEM), TEMPERATURE, MAX_TOKENS)
            .await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyContent);
        }

        info!(
            "Ideal profile generated for job {} ({} characters)",
            job.id,
            text.len()
        );
        Ok(IdealProfile {
            job_id: job.id,
            text: text.to_string(),
        })
    }
}

fn build_profile_prompt(job: &Job) -> String {
    let description = if job.description.trim().is_empty() {
        MISSING_DESCRIPTION.to_string()
    } else {
        job.description.trim().to_string()
    };

    let requirements: Vec<String> = job
        .requirements
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(|r| format!("- {r}"))
        .collect();
    let requirements = if requirements.is_empty() {
        MISSING_REQUIREMENTS.to_string()
    } else {
        requirements.join("\n")
    };

    IDEAL_PROFILE_PROMPT_TEMPLATE
        .replace("{title}", &job.title)
        .replace("{employer}", &job.employer)
        .replace("{location}", &job.location())
        .replace(
            "{wage_band}",
            &format!("${}/hr - ${}/hr", job.wage_min, job.wage_max),
        )
        .replace("{description}", &description)
        .replace("{requirements}", &requirements)
}
