//! Embedding Service — maps texts to unit-length vectors in a shared space.
//!
//! `EmbeddingProvider` is the black-box seam (any OpenAI-compatible `/v1/embeddings`
//! endpoint in production, deterministic fakes in tests). `EmbeddingService` wraps a
//! provider with the model's instruction prefix, sub-batching and all-or-nothing checks.
//!
//! Lifecycle: built once in `main`, shared behind `Arc` read-only, dropped at shutdown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider returned {actual} vectors for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },

    #[error("vector {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("provider returned index {index} at position {position}")]
    IndexMismatch { position: usize, index: usize },

    #[error("vector {index} cannot be normalized (zero or non-finite)")]
    Degenerate { index: usize },

    #[error("text {index} could not be encoded: {reason}")]
    Encode { index: usize, reason: String },
}

/// A fixed-length, L2-normalized vector produced from exactly one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Scales `values` to unit length. `None` for empty, zero or non-finite input.
    pub fn normalized(mut values: Vec<f32>) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let norm = values
            .iter()
            .map(|v| f64::from(*v) * f64::from(*v))
            .sum::<f64>()
            .sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        for v in &mut values {
            *v = (f64::from(*v) / norm) as f32;
        }
        Some(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }
}

/// Raw provider contract: one vector per text, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP provider (OpenAI-compatible /v1/embeddings)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Talks to an OpenAI-compatible embeddings endpoint (OpenAI, vLLM, text-embeddings-inference).
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbeddingProvider {
    pub fn new(
        endpoint: String,
        model: String,
        api_key: Option<String>,
    ) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            endpoint,
            model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response.json().await?;
        order_by_index(body.data)
    }
}

/// Providers may return data out of order; `index` is authoritative and must cover `0..n` exactly.
fn order_by_index(mut data: Vec<EmbeddingDatum>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    data.sort_by_key(|d| d.index);
    data.into_iter()
        .enumerate()
        .map(|(position, d)| {
            if d.index == position {
                Ok(d.embedding)
            } else {
                Err(EmbeddingError::IndexMismatch {
                    position,
                    index: d.index,
                })
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

/// Prefix + batching + validation around a provider.
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    prefix: String,
    batch_size: usize,
}

impl EmbeddingService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, prefix: String, batch_size: usize) -> Self {
        Self {
            provider,
            prefix,
            batch_size: batch_size.max(1),
        }
    }

    /// Embeds every text or fails; never returns a partial result.
    pub async fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let prefixed: Vec<String> = texts
            .iter()
            .map(|t| format!("{}{}", self.prefix, t))
            .collect();

        let mut embeddings = Vec::with_capacity(prefixed.len());
        let mut dimension: Option<usize> = None;

        for (batch_no, batch) in prefixed.chunks(self.batch_size).enumerate() {
            let offset = batch_no * self.batch_size;
            let raw = self.provider.embed(batch).await?;
            if raw.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: batch.len(),
                    actual: raw.len(),
                });
            }

            for (i, values) in raw.into_iter().enumerate() {
                let index = offset + i;
                let expected = *dimension.get_or_insert(values.len());
                if values.len() != expected {
                    return Err(EmbeddingError::DimensionMismatch {
                        index,
                        expected,
                        actual: values.len(),
                    });
                }
                embeddings.push(
                    Embedding::normalized(values).ok_or(EmbeddingError::Degenerate { index })?,
                );
            }
        }

        debug!(
            "Embedded {} texts in {} batch(es)",
            embeddings.len(),
            prefixed.len().div_ceil(self.batch_size)
        );
        Ok(embeddings)
    }

    pub async fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed(&[text])
            .await?
            .pop()
            .ok_or(EmbeddingError::CountMismatch {
                expected: 1,
                actual: 0,
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test fakes
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub const DIM: usize = 64;

    /// Hashed bag-of-words. Every component is non-negative, so any two texts
    /// sharing a token have strictly positive cosine.
    pub struct BagOfWords {
        pub calls: AtomicUsize,
        /// Texts containing this token fail to encode.
        pub poison: Option<String>,
    }

    impl BagOfWords {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                poison: None,
            }
        }

        pub fn poisoned(token: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                poison: Some(token.to_lowercase()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub fn bag_of_words(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; DIM];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let h = word
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            v[h % DIM] += 1.0;
        }
        v
    }

    #[async_trait]
    impl EmbeddingProvider for BagOfWords {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            texts
                .iter()
                .enumerate()
                .map(|(index, t)| match &self.poison {
                    Some(p) if t.to_lowercase().contains(p.as_str()) => {
                        Err(EmbeddingError::Encode {
                            index,
                            reason: "tokenizer rejected input".to_string(),
                        })
                    }
                    _ => Ok(bag_of_words(t)),
                })
                .collect()
        }
    }

    pub fn service(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> EmbeddingService {
        EmbeddingService::new(provider, "query: ".to_string(), batch_size)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::fakes::{service, BagOfWords};
    use super::*;

    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmbeddingProvider for Recording {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.seen.lock().unwrap().extend(texts.iter().cloned());
            Ok(texts.iter().map(|_| vec![3.0, 4.0]).collect())
        }
    }

    struct Fixed(Vec<Vec<f32>>);

    #[async_trait]
    impl EmbeddingProvider for Fixed {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(self.0.clone())
        }
    }

    fn norm(e: &Embedding) -> f64 {
        e.as_slice()
            .iter()
            .map(|v| f64::from(*v).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn test_normalized_has_unit_norm() {
        let e = Embedding::normalized(vec![3.0, 4.0]).unwrap();
        assert!((norm(&e) - 1.0).abs() < 1e-6);
        assert!((e.as_slice()[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_rejects_degenerate() {
        assert!(Embedding::normalized(vec![]).is_none());
        assert!(Embedding::normalized(vec![0.0, 0.0]).is_none());
        assert!(Embedding::normalized(vec![1.0, f32::NAN]).is_none());
    }

    #[test]
    fn test_order_by_index_restores_input_order() {
        let data = vec![
            EmbeddingDatum {
                index: 1,
                embedding: vec![2.0],
            },
            EmbeddingDatum {
                index: 0,
                embedding: vec![1.0],
            },
        ];
        assert_eq!(order_by_index(data).unwrap(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_order_by_index_rejects_duplicate_or_skipped_indices() {
        let datum = |index| EmbeddingDatum {
            index,
            embedding: vec![1.0],
        };
        assert!(matches!(
            order_by_index(vec![datum(0), datum(0)]).unwrap_err(),
            EmbeddingError::IndexMismatch { position: 1, index: 0 }
        ));
        assert!(matches!(
            order_by_index(vec![datum(2), datum(0)]).unwrap_err(),
            EmbeddingError::IndexMismatch { position: 1, index: 2 }
        ));
    }

    #[tokio::test]
    async fn test_prefix_applied_to_every_text() {
        let provider = Arc::new(Recording {
            seen: Mutex::new(vec![]),
        });
        let svc = EmbeddingService::new(provider.clone(), "passage: ".to_string(), 8);
        svc.embed(&["a", "b"]).await.unwrap();
        assert_eq!(
            *provider.seen.lock().unwrap(),
            vec!["passage: a".to_string(), "passage: b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_batch_size_does_not_change_vectors() {
        let texts = [
            "ICU nurse ventilator management",
            "phlebotomy venipuncture",
            "home health aide",
            "travel RN telemetry",
            "medical assistant EHR",
        ];
        let one = service(Arc::new(BagOfWords::new()), 1).embed(&texts).await.unwrap();
        let all = service(Arc::new(BagOfWords::new()), 16).embed(&texts).await.unwrap();
        assert_eq!(one, all);
    }

    #[tokio::test]
    async fn test_sub_batches_issue_multiple_calls() {
        let provider = Arc::new(BagOfWords::new());
        let svc = service(provider.clone(), 2);
        let out = svc.embed(&["a", "b", "c", "d", "e"]).await.unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_in_late_batch_returns_nothing() {
        let svc = service(Arc::new(BagOfWords::poisoned("corrupt")), 2);
        let err = svc
            .embed(&["fine", "also fine", "corrupt resume"])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Encode { .. }));
    }

    #[tokio::test]
    async fn test_count_mismatch_rejected() {
        let svc = EmbeddingService::new(Arc::new(Fixed(vec![vec![1.0]])), String::new(), 8);
        let err = svc.embed(&["a", "b"]).await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let svc = EmbeddingService::new(
            Arc::new(Fixed(vec![vec![1.0, 0.0], vec![1.0]])),
            String::new(),
            8,
        );
        let err = svc.embed(&["a", "b"]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_zero_vector_rejected() {
        let svc = EmbeddingService::new(Arc::new(Fixed(vec![vec![0.0, 0.0]])), String::new(), 8);
        assert!(matches!(
            svc.embed_one("blank").await.unwrap_err(),
            EmbeddingError::Degenerate { index: 0 }
        ));
    }
}
