//! Ideal-profile cache. Best effort: a cache failure is logged and treated as a miss,
//! it never fails a match.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::{debug, warn};

use crate::matching::profile::IdealProfile;
use crate::models::job::Job;

#[async_trait]
pub trait ProfileCache: Send + Sync {
    async fn get(&self, job: &Job) -> Option<IdealProfile>;
    async fn put(&self, job: &Job, profile: &IdealProfile);
}

/// Keyed by job id plus content fingerprint, so editing a job invalidates its entry.
pub fn cache_key(job: &Job) -> String {
    format!("matcher:ideal_profile:{}:{}", job.id, job.fingerprint())
}

#[derive(Clone)]
pub struct RedisProfileCache {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisProfileCache {
    pub async fn connect(url: &str, ttl_secs: u64) -> redis::RedisResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn, ttl_secs })
    }
}

#[async_trait]
impl ProfileCache for RedisProfileCache {
    async fn get(&self, job: &Job) -> Option<IdealProfile> {
        let key = cache_key(job);
        let mut conn = self.conn.clone();
        match redis::cmd("GET")
            .arg(&key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
        {
            Ok(Some(text)) if !text.trim().is_empty() => {
                debug!("Ideal profile cache hit for job {}", job.id);
                Some(IdealProfile {
                    job_id: job.id,
                    text,
                })
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Ideal profile cache read failed for job {}: {e}", job.id);
                None
            }
        }
    }

    async fn put(&self, job: &Job, profile: &IdealProfile) {
        let key = cache_key(job);
        let mut conn = self.conn.clone();
        let result = redis::cmd("SET")
            .arg(&key)
            .arg(&profile.text)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await;
        if let Err(e) = result {
            warn!("Ideal profile cache write failed for job {}: {e}", job.id);
        }
    }
}
