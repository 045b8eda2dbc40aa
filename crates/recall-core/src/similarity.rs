//! Vector math utilities: similarity scoring, normalization, content
//! hashing, and vector encode/decode.
//!
//! Pure functions, no I/O. Everything ranking-related in the Retrieval
//! Engine bottoms out here.

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched dimensions or zero-norm inputs; those cases
/// mean "no meaningful similarity", not an error, because documents without
/// a usable embedding still participate in keyword ranking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Map a cosine similarity from [-1, 1] to [0, 1], clamping out-of-range
/// inputs (float error can push a cosine slightly past ±1).
pub fn normalize_similarity(cosine: f32) -> f32 {
    (cosine.clamp(-1.0, 1.0) + 1.0) / 2.0
}

/// Digest of the exact text embedded under a given model.
///
/// The model name participates in the hash so switching models always
/// reads as "stale" and triggers re-embedding.
pub fn content_hash(model: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Encode a vector as little-endian f32 bytes.
pub fn encode_vector(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into a vector.
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::Serialization(format!(
            "vector byte length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Check a query embedding against the engine's invariants.
///
/// Wrong dimensionality or non-finite values fail with
/// [`Error::InvalidEmbedding`] rather than being silently zeroed out,
/// because a corrupted query vector would corrupt ranking silently.
pub fn validate_embedding(values: &[f32], expected_dim: usize) -> Result<()> {
    if values.len() != expected_dim {
        return Err(Error::InvalidEmbedding(format!(
            "expected {} dimensions, got {}",
            expected_dim,
            values.len()
        )));
    }
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(Error::InvalidEmbedding(format!(
            "non-finite value at index {}",
            idx
        )));
    }
    Ok(())
}
