//! Weighted score fusion of keyword and semantic signals.
//!
//! Both signals arrive already normalized to [0, 1] (keyword scores are
//! max-normalized per call, semantic scores are shifted cosine
//! similarity), so a convex combination of the two is itself in [0, 1]
//! and the weights directly express the keyword/semantic trade-off.

use std::collections::HashMap;

use uuid::Uuid;

use recall_core::defaults::{KEYWORD_WEIGHT, SEMANTIC_WEIGHT};
use recall_core::{Error, Note, Result, RetrievalHit};

/// Relative weight of each retrieval signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub keyword: f32,
    pub semantic: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            keyword: KEYWORD_WEIGHT,
            semantic: SEMANTIC_WEIGHT,
        }
    }
}

impl FusionWeights {
    /// Validate and normalize weights so they sum to 1.
    ///
    /// Rejects negative, non-finite, or all-zero weights; anything else is
    /// rescaled, so callers may pass e.g. (1.0, 2.0) for a 1:2 split.
    pub fn new(keyword: f32, semantic: f32) -> Result<Self> {
        if !keyword.is_finite() || !semantic.is_finite() || keyword < 0.0 || semantic < 0.0 {
            return Err(Error::Config(format!(
                "fusion weights must be finite and non-negative, got keyword={} semantic={}",
                keyword, semantic
            )));
        }
        let sum = keyword + semantic;
        if sum <= 0.0 {
            return Err(Error::Config(
                "fusion weights must not both be zero".to_string(),
            ));
        }
        Ok(Self {
            keyword: keyword / sum,
            semantic: semantic / sum,
        })
    }
}

/// Per-note signal scores feeding fusion. Absent signals stay at 0.0.
#[derive(Debug, Clone, Default)]
pub struct SignalScores {
    pub keyword: f32,
    pub semantic: f32,
    pub snippet: Option<String>,
}

/// Rescale raw keyword scores so the best match within this call is 1.0.
///
/// Full-text rank values are on an implementation-defined scale and are
/// only comparable within one query; normalizing by the call's maximum
/// makes them commensurable with the semantic signal. No-op when the map
/// is empty or every score is zero.
pub fn max_normalize(scores: &mut HashMap<Uuid, f32>) {
    let max = scores.values().cloned().fold(0.0_f32, f32::max);
    if max > 0.0 {
        for score in scores.values_mut() {
            *score /= max;
        }
    }
}

/// Fuse per-note signal scores over the eligible notes into a ranked list.
///
/// Notes where both signals are zero (no keyword match, no stored
/// embedding) are dropped rather than padding the tail with noise.
/// Ordering is total and deterministic: fused score descending, then
/// `updated_at` descending, then note id ascending.
pub fn fuse(
    eligible: &[Note],
    scores: &HashMap<Uuid, SignalScores>,
    weights: FusionWeights,
) -> Vec<RetrievalHit> {
    let mut hits: Vec<(RetrievalHit, chrono::DateTime<chrono::Utc>)> = eligible
        .iter()
        .filter_map(|note| {
            let signals = scores.get(&note.id)?;
            if signals.keyword == 0.0 && signals.semantic == 0.0 {
                return None;
            }
            let fused = weights.keyword * signals.keyword + weights.semantic * signals.semantic;
            Some((
                RetrievalHit {
                    note_id: note.id,
                    score: fused,
                    keyword_score: signals.keyword,
                    semantic_score: signals.semantic,
                    snippet: signals.snippet.clone(),
                    title: Some(note.title.clone()),
                },
                note.updated_at,
            ))
        })
        .collect();

    hits.sort_by(|(a, a_updated), (b, b_updated)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b_updated.cmp(a_updated))
            .then(a.note_id.cmp(&b.note_id))
    });

    hits.into_iter().map(|(hit, _)| hit).collect()
}
