//! Matching Engine — ranks candidates for one job.
//!
//! Flow per job: ideal profile (generate unless supplied) → one batched embedding
//! call for profile + resumes → score every pair → keep score ≥ threshold →
//! sort by score descending, ties in input order.

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{MatchError, ValidationError};
use crate::matching::embedding::{Embedding, EmbeddingError, EmbeddingService};
use crate::matching::profile::{IdealProfile, ProfileGenerator};
use crate::matching::similarity::{euclidean_distance, similarity};
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::models::matches::MatchResult;

/// Minimum score for a candidate to be kept. Always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    /// Rejects out-of-range and NaN values instead of clamping them.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::ThresholdOutOfRange(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Inclusive: a score equal to the threshold is kept.
    pub fn admits(self, score: f64) -> bool {
        score >= self.0
    }
}

/// Everything one `match_all` run produced for a job.
#[derive(Debug, Clone)]
pub struct JobMatches {
    pub profile: IdealProfile,
    /// Candidates with resume text that were scored.
    pub evaluated: usize,
    /// Retained matches, best first.
    pub matches: Vec<MatchResult>,
}

/// Owns the profile generator and a shared handle to the process-wide embedding service.
#[derive(Clone)]
pub struct MatchingEngine {
    profiles: ProfileGenerator,
    embeddings: Arc<EmbeddingService>,
}

impl MatchingEngine {
    pub fn new(profiles: ProfileGenerator, embeddings: Arc<EmbeddingService>) -> Self {
        Self {
            profiles,
            embeddings,
        }
    }

    pub async fn generate_profile(&self, job: &Job) -> Result<IdealProfile, MatchError> {
        job.validate()?;
        Ok(self.profiles.generate(job).await?)
    }

    /// Scores one candidate against one job with no threshold applied.
    /// A supplied profile embedding skips generation and profile embedding entirely;
    /// a supplied profile text skips only generation, and only when it belongs to `job`.
    pub async fn match_one(
        &self,
        job: &Job,
        candidate: &Candidate,
        profile: Option<&IdealProfile>,
        profile_embedding: Option<&Embedding>,
    ) -> Result<MatchResult, MatchError> {
        job.validate()?;
        if !candidate.has_resume() {
            return Err(ValidationError::EmptyResume(candidate.id).into());
        }

        let (anchor, resume) = match profile_embedding {
            Some(anchor) => {
                let resume = self.embeddings.embed_one(&candidate.resume_text).await?;
                (anchor.clone(), resume)
            }
            None => {
                let generated;
                let profile = match profile {
                    Some(p) if p.job_id == job.id => p,
                    _ => {
                        generated = self.profiles.generate(job).await?;
                        &generated
                    }
                };
                let mut pair = self
                    .embeddings
                    .embed(&[profile.text.as_str(), candidate.resume_text.as_str()])
                    .await?;
                let resume = pair.pop();
                let anchor = pair.pop();
                anchor.zip(resume).ok_or(EmbeddingError::CountMismatch {
                    expected: 2,
                    actual: 0,
                })?
            }
        };

        if anchor.dimension() != resume.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                index: 1,
                expected: anchor.dimension(),
                actual: resume.dimension(),
            }
            .into());
        }

        let score = similarity(&anchor, &resume);
        debug!(
            "Job {} / candidate {}: score={:.4} distance={:.4}",
            job.id,
            candidate.id,
            score,
            euclidean_distance(&anchor, &resume)
        );

        Ok(MatchResult {
            job_id: job.id,
            candidate_id: candidate.id,
            score,
        })
    }

    /// Ranked, thresholded matches for one job. Empty when nobody qualifies.
    pub async fn match_all(
        &self,
        job: &Job,
        candidates: &[Candidate],
        threshold: f64,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let threshold = Threshold::new(threshold)?;
        Ok(self
            .match_all_with_profile(job, candidates, threshold, None)
            .await?
            .matches)
    }

    /// `match_all` with an optional cached profile; returns the profile used so callers can cache it.
    pub async fn match_all_with_profile(
        &self,
        job: &Job,
        candidates: &[Candidate],
        threshold: Threshold,
        profile: Option<IdealProfile>,
    ) -> Result<JobMatches, MatchError> {
        job.validate()?;
        info!("Matching {} candidates to job {} ({})", candidates.len(), job.id, job.title);

        let profile = match profile {
            Some(p) if p.job_id == job.id => p,
            _ => self.profiles.generate(job).await?,
        };

        let participants: Vec<&Candidate> = candidates.iter().filter(|c| c.has_resume()).collect();
        if participants.len() < candidates.len() {
            debug!(
                "Skipping {} candidates without resume text",
                candidates.len() - participants.len()
            );
        }

        // Profile first, then resumes, in a single batch.
        let mut texts: Vec<&str> = Vec::with_capacity(participants.len() + 1);
        texts.push(&profile.text);
        texts.extend(participants.iter().map(|c| c.resume_text.as_str()));
        let mut vectors = self.embeddings.embed(&texts).await?.into_iter();
        let anchor = vectors.next().ok_or(EmbeddingError::CountMismatch {
            expected: texts.len(),
            actual: 0,
        })?;

        let mut matches: Vec<MatchResult> = participants
            .iter()
            .zip(vectors)
            .filter_map(|(candidate, resume)| {
                let score = similarity(&anchor, &resume);
                let kept = threshold.admits(score);
                debug!(
                    "  {} {}: {:.2}% (distance {:.4}){}",
                    if kept { "+" } else { "-" },
                    candidate.name,
                    score * 100.0,
                    euclidean_distance(&anchor, &resume),
                    if kept { "" } else { " below threshold" }
                );
                kept.then_some(MatchResult {
                    job_id: job.id,
                    candidate_id: candidate.id,
                    score,
                })
            })
            .collect();

        // Stable sort keeps input order among equal scores.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));

        info!(
            "Job {}: {} of {} candidates at or above {:.2}",
            job.id,
            matches.len(),
            participants.len(),
            threshold.value()
        );

        Ok(JobMatches {
            profile,
            evaluated: participants.len(),
            matches,
        })
    }
}
