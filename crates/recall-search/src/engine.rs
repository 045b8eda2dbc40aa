//! Retrieval engine: executes a validated query plan against the storage
//! ports and returns fused, ranked hits.
//!
//! The engine never talks to an embedding provider; the query vector is
//! produced upstream and handed in. Tenant scoping is enforced by the
//! ports themselves, the engine just threads the tenant id through every
//! call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Days, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use recall_core::defaults::{EMBED_DIMENSION, EMBED_MODEL};
use recall_core::similarity::{cosine_similarity, normalize_similarity, validate_embedding};
use recall_core::{
    DocumentFilter, DocumentStore, EmbeddingRepository, FullTextIndex, QueryPlan, Result,
    RetrievalHit, Vector,
};

use crate::fusion::{fuse, max_normalize, FusionWeights, SignalScores};

/// Configuration for the retrieval engine.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Keyword/semantic trade-off for score fusion.
    pub weights: FusionWeights,
    /// Embedding model whose vectors are read from the repository.
    pub model: String,
    /// Expected dimension of query vectors.
    pub dimension: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            model: EMBED_MODEL.to_string(),
            dimension: EMBED_DIMENSION,
        }
    }
}

/// Multi-signal retrieval over a tenant's notes.
pub struct RetrievalEngine {
    documents: Arc<dyn DocumentStore>,
    index: Arc<dyn FullTextIndex>,
    embeddings: Arc<dyn EmbeddingRepository>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        index: Arc<dyn FullTextIndex>,
        embeddings: Arc<dyn EmbeddingRepository>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            documents,
            index,
            embeddings,
            config,
        }
    }

    /// Execute a query plan for one tenant.
    ///
    /// `query_vector` carries the embedded semantic query; `None` (or an
    /// empty vector) runs keyword-only retrieval. A present vector is
    /// validated against the configured dimension before anything is
    /// fetched. An empty eligible set returns an empty list, never an
    /// error.
    #[instrument(skip(self, plan, query_vector), fields(
        subsystem = "search",
        component = "retrieval_engine",
        op = "retrieve",
        tenant_id = %tenant_id,
    ))]
    pub async fn retrieve(
        &self,
        tenant_id: Uuid,
        plan: &QueryPlan,
        query_vector: Option<&Vector>,
    ) -> Result<Vec<RetrievalHit>> {
        let started = Instant::now();

        let query_vector = query_vector.filter(|v| !v.as_slice().is_empty());
        if let Some(vector) = query_vector {
            validate_embedding(vector.as_slice(), self.config.dimension)?;
        }

        // An inverted time range yields created_after > created_before,
        // which no note satisfies: the empty set falls out naturally.
        let filter = filter_from_plan(plan);
        let eligible = self.documents.list(tenant_id, &filter).await?;
        if eligible.is_empty() {
            debug!(
                tenant_id = %tenant_id,
                "no notes pass the structural filters"
            );
            return Ok(Vec::new());
        }
        let candidate_ids: Vec<Uuid> = eligible.iter().map(|n| n.id).collect();

        let mut keyword_scores: HashMap<Uuid, f32> = HashMap::new();
        let mut snippets: HashMap<Uuid, String> = HashMap::new();
        if !plan.keywords.is_empty() {
            let matches = self
                .index
                .search(
                    tenant_id,
                    &plan.keywords,
                    Some(&candidate_ids),
                    candidate_ids.len() as i64,
                )
                .await?;
            for m in matches {
                keyword_scores.insert(m.note_id, m.score);
                if let Some(snippet) = m.snippet {
                    snippets.insert(m.note_id, snippet);
                }
            }
            max_normalize(&mut keyword_scores);
        }

        let mut semantic_scores: HashMap<Uuid, f32> = HashMap::new();
        if let Some(vector) = query_vector {
            let stored = self
                .embeddings
                .get_many(tenant_id, &candidate_ids, &self.config.model)
                .await?;
            for (note_id, embedding) in stored {
                let cosine = cosine_similarity(vector.as_slice(), embedding.vector.as_slice());
                semantic_scores.insert(note_id, normalize_similarity(cosine));
            }
        }

        let keyword_hits = keyword_scores.len();
        let semantic_hits = semantic_scores.len();
        let scores: HashMap<Uuid, SignalScores> = candidate_ids
            .iter()
            .map(|id| {
                (
                    *id,
                    SignalScores {
                        keyword: keyword_scores.get(id).copied().unwrap_or(0.0),
                        semantic: semantic_scores.get(id).copied().unwrap_or(0.0),
                        snippet: snippets.remove(id),
                    },
                )
            })
            .collect();

        let mut hits = fuse(&eligible, &scores, self.config.weights);
        hits.truncate(plan.limit.max(0) as usize);

        info!(
            tenant_id = %tenant_id,
            eligible_count = eligible.len(),
            keyword_hits,
            semantic_hits,
            result_count = hits.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "retrieval complete"
        );
        Ok(hits)
    }
}

/// Translate a plan's structural constraints into a document filter.
///
/// Inclusive calendar dates become half-open instants: the start date at
/// midnight, and midnight of the day after the end date. Day boundaries
/// fall in the range's timezone when one is given, otherwise UTC.
fn filter_from_plan(plan: &QueryPlan) -> DocumentFilter {
    let (created_after, created_before) = match &plan.time_range {
        Some(range) => {
            let tz = range.timezone.as_deref();
            (
                range.start.and_then(|d| day_start(d, tz)),
                range
                    .end
                    .and_then(|d| d.checked_add_days(Days::new(1)))
                    .and_then(|d| day_start(d, tz)),
            )
        }
        None => (None, None),
    };
    DocumentFilter {
        folders: plan.folders.clone(),
        include_tags: plan.include_tags.clone(),
        exclude_tags: plan.exclude_tags.clone(),
        created_after,
        created_before,
    }
}

fn day_start(date: chrono::NaiveDate, timezone: Option<&str>) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    if let Some(name) = timezone {
        match name.parse::<Tz>() {
            Ok(tz) => {
                // `earliest` resolves DST gaps where midnight does not exist.
                if let Some(local) = tz.from_local_datetime(&naive).earliest() {
                    return Some(local.with_timezone(&Utc));
                }
            }
            Err(_) => warn!(timezone = name, "unknown timezone, using UTC day boundaries"),
        }
    }
    Some(Utc.from_utc_datetime(&naive))
}
