//! In-memory implementations of the storage ports.
//!
//! Always compiled (not test-gated) so integration tests across the
//! workspace can exercise the full retrieval pipeline without a running
//! PostgreSQL. The keyword index is a linear-scan term-frequency ranker
//! with the same field weighting idea as the Postgres adapter (title >
//! tags > content); its score scale is different, which is fine: the
//! port only promises monotonicity within one call.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use recall_core::defaults::SNIPPET_LENGTH;
use recall_core::{
    AskHistoryStore, AskRecord, DocumentFilter, DocumentStore, EmbeddingRepository, Error,
    FullTextIndex, KeywordMatch, Note, NoteEmbedding, Result, Vector,
};

/// Per-occurrence field weights, mirroring the Postgres adapter's
/// setweight(A/B/C) ordering.
const TITLE_WEIGHT: f32 = 1.0;
const TAG_WEIGHT: f32 = 0.4;
const CONTENT_WEIGHT: f32 = 0.2;

#[derive(Default)]
struct Inner {
    /// (tenant, note id) → note. Tenant-first keys keep scoping explicit.
    notes: HashMap<(Uuid, Uuid), Note>,
    /// (tenant, note id, model) → embedding.
    embeddings: HashMap<(Uuid, Uuid, String), NoteEmbedding>,
    history: Vec<AskRecord>,
}

/// In-memory store implementing all four storage ports.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a note (test helper; production note CRUD is out of scope).
    pub fn insert_note(&self, note: Note) {
        let mut inner = self.inner.write().expect("memory store poisoned");
        inner.notes.insert((note.tenant_id, note.id), note);
    }

    /// All persisted ask records, oldest first.
    pub fn history(&self) -> Vec<AskRecord> {
        self.inner
            .read()
            .expect("memory store poisoned")
            .history
            .clone()
    }

    /// Number of stored embeddings across all tenants.
    pub fn embedding_count(&self) -> usize {
        self.inner
            .read()
            .expect("memory store poisoned")
            .embeddings
            .len()
    }
}

fn folder_matches(folder: Option<&str>, filters: &[String]) -> bool {
    let Some(folder) = folder else {
        return false;
    };
    filters
        .iter()
        .any(|f| folder == f || folder.starts_with(&format!("{}/", f)))
}

fn passes_filter(note: &Note, filter: &DocumentFilter) -> bool {
    if let Some(folders) = &filter.folders {
        if !folder_matches(note.folder.as_deref(), folders) {
            return false;
        }
    }
    if !filter.include_tags.is_empty()
        && !note.tags.iter().any(|t| filter.include_tags.contains(t))
    {
        return false;
    }
    if note.tags.iter().any(|t| filter.exclude_tags.contains(t)) {
        return false;
    }
    if let Some(after) = filter.created_after {
        if note.created_at < after {
            return false;
        }
    }
    if let Some(before) = filter.created_before {
        if note.created_at >= before {
            return false;
        }
    }
    true
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn occurrences(haystack: &[String], term: &str) -> usize {
    haystack.iter().filter(|t| t.as_str() == term).count()
}

fn keyword_score(note: &Note, terms: &[String]) -> f32 {
    let title_tokens = tokenize(&note.title);
    let tag_tokens: Vec<String> = note.tags.iter().flat_map(|t| tokenize(t)).collect();
    let content_tokens = tokenize(&note.content);

    let mut score = 0.0;
    for term in terms {
        score += occurrences(&title_tokens, term) as f32 * TITLE_WEIGHT;
        score += occurrences(&tag_tokens, term) as f32 * TAG_WEIGHT;
        score += occurrences(&content_tokens, term) as f32 * CONTENT_WEIGHT;
    }
    score
}

fn snippet_for(note: &Note, terms: &[String]) -> Option<String> {
    let lower = note.content.to_lowercase();
    let mut start = terms
        .iter()
        .filter_map(|t| lower.find(t.as_str()))
        .min()
        .unwrap_or(0)
        .min(note.content.len());
    // Lowercasing can shift byte offsets; back up to a char boundary.
    while start > 0 && !note.content.is_char_boundary(start) {
        start -= 1;
    }
    let snippet: String = note.content[start..].chars().take(SNIPPET_LENGTH).collect();
    if snippet.is_empty() {
        None
    } else {
        Some(snippet)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, tenant_id: Uuid, filter: &DocumentFilter) -> Result<Vec<Note>> {
        let inner = self.inner.read().expect("memory store poisoned");
        let mut notes: Vec<Note> = inner
            .notes
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, n)| n.clone())
            .filter(|n| passes_filter(n, filter))
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    async fn get(&self, tenant_id: Uuid, note_id: Uuid) -> Result<Option<Note>> {
        let inner = self.inner.read().expect("memory store poisoned");
        Ok(inner.notes.get(&(tenant_id, note_id)).cloned())
    }
}

#[async_trait]
impl FullTextIndex for MemoryStore {
    async fn search(
        &self,
        tenant_id: Uuid,
        keywords: &[String],
        candidates: Option<&[Uuid]>,
        limit: i64,
    ) -> Result<Vec<KeywordMatch>> {
        let terms: Vec<String> = keywords.iter().flat_map(|k| tokenize(k)).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self.inner.read().expect("memory store poisoned");
        let mut matches: Vec<KeywordMatch> = inner
            .notes
            .iter()
            .filter(|((t, id), _)| {
                *t == tenant_id && candidates.map_or(true, |c| c.contains(id))
            })
            .filter_map(|(_, note)| {
                let score = keyword_score(note, &terms);
                if score > 0.0 {
                    Some(KeywordMatch {
                        note_id: note.id,
                        score,
                        snippet: snippet_for(note, &terms),
                    })
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.note_id.cmp(&b.note_id))
        });
        matches.truncate(limit.max(0) as usize);
        Ok(matches)
    }
}

#[async_trait]
impl EmbeddingRepository for MemoryStore {
    async fn upsert(
        &self,
        tenant_id: Uuid,
        note_id: Uuid,
        model: &str,
        content_hash: &str,
        vector: &Vector,
    ) -> Result<()> {
        let mut inner = self.inner.write().expect("memory store poisoned");
        let key = (tenant_id, note_id, model.to_string());
        let now = Utc::now();
        let created_at = inner
            .embeddings
            .get(&key)
            .map(|e| e.created_at)
            .unwrap_or(now);
        // Vector and hash replaced under one write lock: no torn state.
        inner.embeddings.insert(
            key,
            NoteEmbedding {
                tenant_id,
                note_id,
                model: model.to_string(),
                content_hash: content_hash.to_string(),
                vector: vector.clone(),
                created_at,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        note_id: Uuid,
        model: &str,
    ) -> Result<Option<NoteEmbedding>> {
        let inner = self.inner.read().expect("memory store poisoned");
        Ok(inner
            .embeddings
            .get(&(tenant_id, note_id, model.to_string()))
            .cloned())
    }

    async fn get_many(
        &self,
        tenant_id: Uuid,
        note_ids: &[Uuid],
        model: &str,
    ) -> Result<HashMap<Uuid, NoteEmbedding>> {
        let inner = self.inner.read().expect("memory store poisoned");
        Ok(note_ids
            .iter()
            .filter_map(|id| {
                inner
                    .embeddings
                    .get(&(tenant_id, *id, model.to_string()))
                    .map(|e| (*id, e.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl AskHistoryStore for MemoryStore {
    async fn append(&self, record: &AskRecord) -> Result<()> {
        let mut inner = self.inner.write().expect("memory store poisoned");
        if inner.history.iter().any(|r| r.id == record.id) {
            return Err(Error::Internal(format!(
                "duplicate ask history id {}",
                record.id
            )));
        }
        inner.history.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn note(tenant: Uuid, title: &str, content: &str, folder: Option<&str>, tags: &[&str]) -> Note {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            title: title.to_string(),
            content: content.to_string(),
            folder: folder.map(String::from),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn list_is_tenant_scoped() {
        let store = MemoryStore::new();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        store.insert_note(note(tenant_a, "A note", "alpha", None, &[]));
        store.insert_note(note(tenant_b, "B note", "beta", None, &[]));

        let notes = store.list(tenant_a, &DocumentFilter::default()).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "A note");
    }

    #[tokio::test]
    async fn folder_filter_is_prefix_not_substring() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        store.insert_note(note(tenant, "w", "", Some("work"), &[]));
        store.insert_note(note(tenant, "wp", "", Some("work/projects"), &[]));
        store.insert_note(note(tenant, "ws", "", Some("workshop"), &[]));

        let filter = DocumentFilter {
            folders: Some(vec!["work".to_string()]),
            ..Default::default()
        };
        let notes = store.list(tenant, &filter).await.unwrap();
        let titles: Vec<&str> = notes.iter().map(|n| n.title.as_str()).collect();
        assert!(titles.contains(&"w"));
        assert!(titles.contains(&"wp"));
        assert!(!titles.contains(&"ws"));
    }

    #[tokio::test]
    async fn include_tags_are_or_exclude_tags_win() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        store.insert_note(note(tenant, "a", "", None, &["travel"]));
        store.insert_note(note(tenant, "b", "", None, &["travel", "draft"]));
        store.insert_note(note(tenant, "c", "", None, &["recipes"]));

        let filter = DocumentFilter {
            include_tags: vec!["travel".to_string(), "recipes".to_string()],
            exclude_tags: vec!["draft".to_string()],
            ..Default::default()
        };
        let notes = store.list(tenant, &filter).await.unwrap();
        let titles: Vec<&str> = notes.iter().map(|n| n.title.as_str()).collect();
        assert!(titles.contains(&"a"));
        assert!(titles.contains(&"c"));
        assert!(!titles.contains(&"b"));
    }

    #[tokio::test]
    async fn created_range_bounds_are_half_open() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let mut feb = note(tenant, "feb", "", None, &[]);
        feb.created_at = Utc.with_ymd_and_hms(2025, 2, 15, 12, 0, 0).unwrap();
        let mut mar = note(tenant, "mar", "", None, &[]);
        mar.created_at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        store.insert_note(feb);
        store.insert_note(mar);

        let filter = DocumentFilter {
            created_after: Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()),
            created_before: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let notes = store.list(tenant, &filter).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "feb");
    }

    #[tokio::test]
    async fn keyword_search_weights_title_over_content() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        store.insert_note(note(tenant, "sourdough starter", "notes", None, &[]));
        store.insert_note(note(tenant, "shopping", "buy sourdough bread", None, &[]));

        let hits = store
            .search(tenant, &["sourdough".to_string()], None, 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn keyword_search_respects_candidates() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let a = note(tenant, "espresso", "espresso notes", None, &[]);
        let b = note(tenant, "espresso too", "more espresso", None, &[]);
        let a_id = a.id;
        store.insert_note(a);
        store.insert_note(b);

        let hits = store
            .search(tenant, &["espresso".to_string()], Some(&[a_id]), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note_id, a_id);
    }

    #[tokio::test]
    async fn empty_keywords_return_no_matches() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        store.insert_note(note(tenant, "anything", "at all", None, &[]));
        let hits = store.search(tenant, &[], None, 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_vector_and_hash_together() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4();
        let note_id = Uuid::new_v4();

        store
            .upsert(tenant, note_id, "m", "hash-1", &Vector::from(vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(tenant, note_id, "m", "hash-2", &Vector::from(vec![0.0, 1.0]))
            .await
            .unwrap();

        assert_eq!(store.embedding_count(), 1);
        let emb = EmbeddingRepository::get(&store, tenant, note_id, "m")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(emb.content_hash, "hash-2");
        assert_eq!(emb.vector.as_slice(), &[0.0, 1.0]);
    }

    #[tokio::test]
    async fn embeddings_are_tenant_scoped() {
        let store = MemoryStore::new();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        let note_id = Uuid::new_v4();

        store
            .upsert(tenant_a, note_id, "m", "h", &Vector::from(vec![1.0]))
            .await
            .unwrap();

        assert!(EmbeddingRepository::get(&store, tenant_b, note_id, "m")
            .await
            .unwrap()
            .is_none());
        let many = store.get_many(tenant_b, &[note_id], "m").await.unwrap();
        assert!(many.is_empty());
    }

    #[tokio::test]
    async fn history_append_rejects_duplicate_ids() {
        let store = MemoryStore::new();
        let record = AskRecord {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            query: "q".to_string(),
            plan: serde_json::json!({}),
            answer_markdown: "a".to_string(),
            cited_note_ids: vec![],
            source_scores: None,
            created_at: Utc::now(),
        };
        store.append(&record).await.unwrap();
        assert!(store.append(&record).await.is_err());
        assert_eq!(store.history().len(), 1);
    }
}
