//! Port traits for recall.
//!
//! These traits define the interfaces that concrete adapters must satisfy,
//! enabling pluggable backends and testability. Every document-touching
//! method takes the tenant id as its first argument; no implementation may
//! return or affect another tenant's rows under any code path.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AskRecord, Note, NoteEmbedding, Vector};

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Structural filters applied when listing a tenant's notes.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Folder prefix filters. A filter "work" matches "work" and
    /// "work/anything" but not "workshop". `None` means unrestricted.
    pub folders: Option<Vec<String>>,
    /// OR semantics: keep notes carrying any of these tags. Empty = all.
    pub include_tags: Vec<String>,
    /// AND-NOT semantics: drop notes carrying any of these tags.
    pub exclude_tags: Vec<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`. An inclusive end date D
    /// becomes midnight of D+1 here.
    pub created_before: Option<DateTime<Utc>>,
}

/// Read-only access to a tenant's notes.
///
/// Implementations enforce tenant scoping themselves; the Retrieval Engine
/// trusts them to never leak cross-tenant rows.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List a tenant's notes passing the structural filters.
    async fn list(&self, tenant_id: Uuid, filter: &DocumentFilter) -> Result<Vec<Note>>;

    /// Fetch a single note, or `None` if absent for this tenant.
    async fn get(&self, tenant_id: Uuid, note_id: Uuid) -> Result<Option<Note>>;
}

// =============================================================================
// FULL-TEXT INDEX
// =============================================================================

/// One keyword-ranked match.
#[derive(Debug, Clone)]
pub struct KeywordMatch {
    pub note_id: Uuid,
    /// Implementation-defined scale; monotonic (higher = more relevant)
    /// and comparable within one call.
    pub score: f32,
    pub snippet: Option<String>,
}

/// Keyword-searchable index over note title, content and tags.
#[async_trait]
pub trait FullTextIndex: Send + Sync {
    /// Rank a tenant's notes against the keyword phrases.
    ///
    /// When `candidates` is given, only those note ids participate.
    /// An empty keyword list returns no matches (cheaper than ranking
    /// everything at zero).
    async fn search(
        &self,
        tenant_id: Uuid,
        keywords: &[String],
        candidates: Option<&[Uuid]>,
        limit: i64,
    ) -> Result<Vec<KeywordMatch>>;
}

// =============================================================================
// EMBEDDING STORAGE
// =============================================================================

/// Persistence for per-note embedding vectors.
///
/// Uniqueness invariant: at most one embedding per (tenant, note, model).
#[async_trait]
pub trait EmbeddingRepository: Send + Sync {
    /// Idempotent write keyed by (tenant, note, model). A second call with
    /// the same key replaces vector and hash together; the pair is never
    /// observable in a torn state.
    async fn upsert(
        &self,
        tenant_id: Uuid,
        note_id: Uuid,
        model: &str,
        content_hash: &str,
        vector: &Vector,
    ) -> Result<()>;

    /// Fetch one embedding, or `None` when the note has no vector under
    /// this model.
    async fn get(
        &self,
        tenant_id: Uuid,
        note_id: Uuid,
        model: &str,
    ) -> Result<Option<NoteEmbedding>>;

    /// Batch fetch for a set of the tenant's notes. Missing notes are
    /// simply absent from the map.
    async fn get_many(
        &self,
        tenant_id: Uuid,
        note_ids: &[Uuid],
        model: &str,
    ) -> Result<HashMap<Uuid, NoteEmbedding>>;
}

// =============================================================================
// PROVIDER BACKENDS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for schema-constrained text completion.
///
/// Used by both the Query Planner and the Answer Synthesizer. The provider
/// is constrained to return a value conforming to `response_schema`;
/// callers still defensively validate the parsed value, since provider
/// compliance is probabilistic.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion and parse the response as JSON.
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        response_schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// ASK HISTORY
// =============================================================================

/// Append-only store of completed question-answer interactions.
/// No read API: history browsing is a separate surface.
#[async_trait]
pub trait AskHistoryStore: Send + Sync {
    async fn append(&self, record: &AskRecord) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_filter_default_is_unrestricted() {
        let filter = DocumentFilter::default();
        assert!(filter.folders.is_none());
        assert!(filter.include_tags.is_empty());
        assert!(filter.exclude_tags.is_empty());
        assert!(filter.created_after.is_none());
        assert!(filter.created_before.is_none());
    }

    #[test]
    fn ports_are_object_safe() {
        fn assert_obj<T: ?Sized>() {}
        assert_obj::<dyn DocumentStore>();
        assert_obj::<dyn FullTextIndex>();
        assert_obj::<dyn EmbeddingRepository>();
        assert_obj::<dyn EmbeddingBackend>();
        assert_obj::<dyn CompletionBackend>();
        assert_obj::<dyn AskHistoryStore>();
    }
}
