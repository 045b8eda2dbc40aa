//! Embedding store service: turns text into persisted vectors.
//!
//! Sits between the embedding backend (provider) and the embedding
//! repository (storage). Note indexing is hash-gated so unchanged notes
//! never hit the provider; query embedding never touches storage.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use recall_core::similarity::{content_hash, validate_embedding};
use recall_core::{EmbeddingBackend, EmbeddingRepository, Error, Note, Result, Vector};

/// Embedding generation and persistence for one model.
pub struct EmbeddingStore {
    repository: Arc<dyn EmbeddingRepository>,
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingStore {
    pub fn new(repository: Arc<dyn EmbeddingRepository>, backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            repository,
            backend,
        }
    }

    /// Model the backend embeds with.
    pub fn model(&self) -> &str {
        self.backend.model_name()
    }

    /// Embed a standalone query string.
    ///
    /// Blank input short-circuits to an empty vector without calling the
    /// provider; the caller treats that as "no semantic signal". A
    /// non-blank input always produces a vector of the backend's
    /// dimension, validated before it is returned.
    #[instrument(skip(self, text), fields(
        subsystem = "search",
        component = "embedding_store",
        op = "embed_query",
    ))]
    pub async fn embed_query(&self, text: &str) -> Result<Vector> {
        if text.trim().is_empty() {
            debug!("blank query text, skipping provider call");
            return Ok(Vector::from(Vec::new()));
        }

        let mut vectors = self.backend.embed_texts(&[text.to_string()]).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("provider returned no vectors".to_string()))?;
        validate_embedding(vector.as_slice(), self.backend.dimension())?;
        Ok(vector)
    }

    /// Ensure a note's stored embedding matches its current text.
    ///
    /// Returns `true` when a new vector was generated and written, `false`
    /// when the stored hash already matches (no provider call made).
    #[instrument(skip(self, note), fields(
        subsystem = "search",
        component = "embedding_store",
        op = "index_note",
        tenant_id = %note.tenant_id,
        note_id = %note.id,
    ))]
    pub async fn index_note(&self, note: &Note) -> Result<bool> {
        let model = self.backend.model_name();
        let text = note.indexable_text();
        let hash = content_hash(model, &text);

        let existing = self
            .repository
            .get(note.tenant_id, note.id, model)
            .await?;
        if existing.is_some_and(|e| e.content_hash == hash) {
            debug!("embedding up to date");
            return Ok(false);
        }

        let mut vectors = self.backend.embed_texts(&[text]).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("provider returned no vectors".to_string()))?;
        validate_embedding(vector.as_slice(), self.backend.dimension())?;

        self.repository
            .upsert(note.tenant_id, note.id, model, &hash, &vector)
            .await?;
        info!(model, "note embedding refreshed");
        Ok(true)
    }

    /// Index a batch of notes, returning how many were (re)embedded.
    pub async fn index_notes(&self, notes: &[Note]) -> Result<usize> {
        let mut refreshed = 0;
        for note in notes {
            if self.index_note(note).await? {
                refreshed += 1;
            }
        }
        Ok(refreshed)
    }

    /// Fetch the stored embedding for one note, if any.
    pub async fn get(&self, tenant_id: Uuid, note_id: Uuid) -> Result<Option<recall_core::NoteEmbedding>> {
        self.repository
            .get(tenant_id, note_id, self.backend.model_name())
            .await
    }
}
