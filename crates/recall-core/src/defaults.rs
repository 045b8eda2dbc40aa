//! Centralized default constants for recall.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Default number of hits an ask request retrieves.
pub const DEFAULT_RESULT_LIMIT: i64 = 12;

/// Hard ceiling on retrieved hits, regardless of what the planner or the
/// completion provider proposes.
pub const MAX_RESULT_LIMIT: i64 = 50;

/// Default keyword weight in score fusion. Keyword + semantic sum to 1.
pub const KEYWORD_WEIGHT: f32 = 0.4;

/// Default semantic weight in score fusion. The larger share, because
/// keyword scores are max-normalized per call and the keyword list is
/// frequently empty.
pub const SEMANTIC_WEIGHT: f32 = 0.6;

// =============================================================================
// SNIPPET
// =============================================================================

/// Snippet/preview length in characters for retrieval hits.
pub const SNIPPET_LENGTH: usize = 200;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama endpoint.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default embedding model name (Ollama).
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default embedding vector dimension for nomic-embed-text.
pub const EMBED_DIMENSION: usize = 768;

/// Default generation model for planning and synthesis.
pub const GEN_MODEL: &str = "qwen3:8b";

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 60;

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 300;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_ordered() {
        assert!(DEFAULT_RESULT_LIMIT >= 1);
        assert!(DEFAULT_RESULT_LIMIT <= MAX_RESULT_LIMIT);
    }

    #[test]
    fn fusion_weights_are_convex() {
        assert!((KEYWORD_WEIGHT + SEMANTIC_WEIGHT - 1.0).abs() < 1e-6);
        assert!(KEYWORD_WEIGHT >= 0.0 && SEMANTIC_WEIGHT >= 0.0);
    }
}
