//! Ask pipeline orchestrator: runs the stages in order and persists the
//! completed interaction.
//!
//! History is written exactly once, after synthesis succeeds. A failure in
//! any stage aborts the ask and leaves no record; there are no retries and
//! nothing to roll back, since every stage before the append is read-only.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use recall_core::{
    AskHistoryStore, AskRecord, DocumentFilter, DocumentStore, Note, NoteSummary, QueryPlan,
    Result, RetrievalHit,
};
use recall_search::{EmbeddingStore, RetrievalEngine};

use crate::planner::{PlannerContext, QueryPlanner};
use crate::synthesizer::AnswerSynthesizer;

/// Everything a completed ask produces.
#[derive(Debug, Clone)]
pub struct AskOutcome {
    /// Id of the persisted history record.
    pub record_id: Uuid,
    pub answer_markdown: String,
    /// Summaries of the cited notes, in citation order.
    pub citations: Vec<NoteSummary>,
    pub followups: Vec<String>,
    /// The plan that was executed, for display and debugging.
    pub plan: QueryPlan,
    /// The ranked hits the answer was drawn from.
    pub hits: Vec<RetrievalHit>,
}

/// The full ask pipeline over one tenant corpus.
pub struct AskPipeline {
    planner: QueryPlanner,
    embeddings: EmbeddingStore,
    engine: RetrievalEngine,
    synthesizer: AnswerSynthesizer,
    documents: Arc<dyn DocumentStore>,
    history: Arc<dyn AskHistoryStore>,
}

impl AskPipeline {
    pub fn new(
        planner: QueryPlanner,
        embeddings: EmbeddingStore,
        engine: RetrievalEngine,
        synthesizer: AnswerSynthesizer,
        documents: Arc<dyn DocumentStore>,
        history: Arc<dyn AskHistoryStore>,
    ) -> Self {
        Self {
            planner,
            embeddings,
            engine,
            synthesizer,
            documents,
            history,
        }
    }

    /// Answer a question over one tenant's notes.
    #[instrument(skip(self, question), fields(
        subsystem = "ask",
        component = "pipeline",
        op = "ask",
        tenant_id = %tenant_id,
    ))]
    pub async fn ask(&self, tenant_id: Uuid, question: &str) -> Result<AskOutcome> {
        let started = Instant::now();

        debug!(stage = "planning", "translating question into a plan");
        let context = self.planner_context(tenant_id).await?;
        let plan = self.planner.plan(question, &context).await?;

        debug!(stage = "embedding", "embedding the semantic query");
        let query_vector = self.embeddings.embed_query(&plan.semantic_query).await?;

        debug!(stage = "retrieval", "ranking the tenant's notes");
        let hits = self
            .engine
            .retrieve(tenant_id, &plan, Some(&query_vector))
            .await?;

        debug!(stage = "synthesis", hit_count = hits.len(), "writing the answer");
        let sources = self.fetch_sources(tenant_id, &hits).await?;
        let answer = self.synthesizer.synthesize(question, &plan, &sources).await?;

        debug!(stage = "history", "persisting the interaction");
        let record = AskRecord {
            id: Uuid::new_v4(),
            tenant_id,
            query: question.to_string(),
            plan: serde_json::to_value(&plan)?,
            answer_markdown: answer.answer_markdown.clone(),
            cited_note_ids: answer.cited_note_ids.clone(),
            source_scores: Some(source_scores(&hits)),
            created_at: Utc::now(),
        };
        self.history.append(&record).await?;

        let citations = answer
            .cited_note_ids
            .iter()
            .filter_map(|id| {
                sources
                    .iter()
                    .find(|n| n.id == *id)
                    .map(NoteSummary::from)
            })
            .collect();

        info!(
            result_count = hits.len(),
            citation_count = answer.cited_note_ids.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "ask complete"
        );
        Ok(AskOutcome {
            record_id: record.id,
            answer_markdown: answer.answer_markdown,
            citations,
            followups: answer.followups,
            plan,
            hits,
        })
    }

    /// Collect the corpus facts the planner grounds its prompt with.
    async fn planner_context(&self, tenant_id: Uuid) -> Result<PlannerContext> {
        let notes = self
            .documents
            .list(tenant_id, &DocumentFilter::default())
            .await?;

        let mut tags: Vec<String> = notes.iter().flat_map(|n| n.tags.clone()).collect();
        tags.sort();
        tags.dedup();

        let mut folders: Vec<String> = notes.iter().filter_map(|n| n.folder.clone()).collect();
        folders.sort();
        folders.dedup();

        Ok(PlannerContext::new(tags, folders, Utc::now().date_naive()))
    }

    /// Load the full notes behind the ranked hits, preserving hit order.
    async fn fetch_sources(&self, tenant_id: Uuid, hits: &[RetrievalHit]) -> Result<Vec<Note>> {
        let mut sources = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some(note) = self.documents.get(tenant_id, hit.note_id).await? {
                sources.push(note);
            }
        }
        Ok(sources)
    }
}

fn source_scores(hits: &[RetrievalHit]) -> serde_json::Value {
    serde_json::Value::Array(
        hits.iter()
            .map(|h| {
                serde_json::json!({
                    "note_id": h.note_id,
                    "score": h.score,
                    "keyword_score": h.keyword_score,
                    "semantic_score": h.semantic_score,
                })
            })
            .collect(),
    )
}
