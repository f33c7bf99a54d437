//! Similarity Scorer — cosine similarity remapped from [-1, 1] to [0, 1].

use crate::matching::embedding::Embedding;

/// `(cos + 1) / 2`, clamped into [0, 1].
///
/// Both vectors are unit length, so the dot product is the cosine. Accumulates in
/// f64 and clamps afterwards to absorb rounding past either bound.
pub fn similarity(a: &Embedding, b: &Embedding) -> f64 {
    debug_assert_eq!(a.dimension(), b.dimension());
    let cos = dot(a.as_slice(), b.as_slice()).clamp(-1.0, 1.0);
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Euclidean distance between two embeddings. Diagnostic only; lower is closer.
pub fn euclidean_distance(a: &Embedding, b: &Embedding) -> f64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}
