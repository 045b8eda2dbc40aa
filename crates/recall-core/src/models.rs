//! Core data models for recall.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Vector type shared with pgvector so embeddings round-trip through the
// database without conversion.
pub use pgvector::Vector;

/// A tenant-owned note: the single corpus type recall indexes.
///
/// Notes are mutated only through the document-store collaborator;
/// retrieval never writes to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    /// Owning tenant. Every read path is scoped by this id.
    pub tenant_id: Uuid,
    pub title: String,
    pub content: String,
    /// Slash-delimited folder hierarchy ("work/projects/alpha").
    /// `None` means the note lives at the corpus root.
    pub folder: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// The text that gets embedded and full-text indexed for this note.
    ///
    /// Title and content concatenated; tags are indexed separately with
    /// their own field weight.
    pub fn indexable_text(&self) -> String {
        if self.title.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n\n{}", self.title, self.content)
        }
    }
}

/// Lightweight note projection for result display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: Uuid,
    pub title: String,
    pub folder: Option<String>,
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            folder: note.folder.clone(),
            tags: note.tags.clone(),
            updated_at: note.updated_at,
        }
    }
}

/// Stored embedding for one (tenant, note, model) triple.
///
/// At most one row exists per key; `content_hash` is the digest of the
/// exact text that was embedded and is written atomically with the vector.
#[derive(Debug, Clone)]
pub struct NoteEmbedding {
    pub tenant_id: Uuid,
    pub note_id: Uuid,
    pub model: String,
    pub content_hash: String,
    pub vector: Vector,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ranked retrieval result.
///
/// `score` is the fused ranking score; the contributing signal scores are
/// kept so callers can audit how the ranking was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub note_id: Uuid,
    /// Fused score in [0, 1]. The ordering of hits is the primary contract.
    pub score: f32,
    /// Max-normalized keyword (full-text) score in [0, 1].
    pub keyword_score: f32,
    /// Normalized cosine similarity in [0, 1]; 0.0 when no embedding exists.
    pub semantic_score: f32,
    pub snippet: Option<String>,
    pub title: Option<String>,
}

/// Persisted record of one completed question-answer interaction.
///
/// Written exactly once, after synthesis succeeds; never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Original question text.
    pub query: String,
    /// Serialized query plan that was executed.
    pub plan: serde_json::Value,
    pub answer_markdown: String,
    /// Ordered citations; always a subset of the retrieved note ids.
    pub cited_note_ids: Vec<Uuid>,
    /// Per-hit signal scores, kept for later ranking analysis.
    pub source_scores: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        Note {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            title: "Standup notes".to_string(),
            content: "Discussed the retrieval rollout.".to_string(),
            folder: Some("work/meetings".to_string()),
            tags: vec!["standup".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn indexable_text_joins_title_and_content() {
        let note = sample_note();
        let text = note.indexable_text();
        assert!(text.starts_with("Standup notes"));
        assert!(text.ends_with("Discussed the retrieval rollout."));
    }

    #[test]
    fn indexable_text_without_title_is_content() {
        let mut note = sample_note();
        note.title = String::new();
        assert_eq!(note.indexable_text(), note.content);
    }

    #[test]
    fn note_summary_from_note() {
        let note = sample_note();
        let summary = NoteSummary::from(&note);
        assert_eq!(summary.id, note.id);
        assert_eq!(summary.title, note.title);
        assert_eq!(summary.folder, note.folder);
    }

    #[test]
    fn retrieval_hit_serializes() {
        let hit = RetrievalHit {
            note_id: Uuid::new_v4(),
            score: 0.8,
            keyword_score: 0.5,
            semantic_score: 0.9,
            snippet: Some("…rollout…".to_string()),
            title: Some("Standup notes".to_string()),
        };
        let json = serde_json::to_string(&hit).unwrap();
        let back: RetrievalHit = serde_json::from_str(&json).unwrap();
        assert_eq!(back.note_id, hit.note_id);
        assert!((back.score - 0.8).abs() < f32::EPSILON);
    }
}
