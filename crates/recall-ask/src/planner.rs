//! Query planner: question text in, validated query plan out.
//!
//! The completion provider does the language understanding; everything it
//! returns is treated as untrusted and post-processed here. Unknown tags
//! and folders are pruned (a hallucinated filter would silently empty the
//! result set), unconfident time ranges are dropped, and the limit is
//! clamped into range.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use recall_core::defaults::MAX_RESULT_LIMIT;
use recall_core::{
    resolve_time_range, CompletionBackend, Error, QueryPlan, RawQueryPlan, Result,
};

/// Corpus facts the planner grounds the provider with.
#[derive(Debug, Clone)]
pub struct PlannerContext {
    /// Tags that actually exist in the tenant's corpus.
    pub known_tags: Vec<String>,
    /// Folders that actually exist in the tenant's corpus.
    pub known_folders: Vec<String>,
    /// "Today" for resolving relative temporal references.
    pub reference_date: NaiveDate,
    /// Hard ceiling on the plan's result limit.
    pub max_results: i64,
}

impl PlannerContext {
    pub fn new(
        known_tags: Vec<String>,
        known_folders: Vec<String>,
        reference_date: NaiveDate,
    ) -> Self {
        Self {
            known_tags,
            known_folders,
            reference_date,
            max_results: MAX_RESULT_LIMIT,
        }
    }
}

const PLANNER_SYSTEM: &str = "You translate questions about a personal note \
collection into a structured retrieval plan. Work only with the tags and \
folders listed in the prompt; never invent new ones. Only fill the time \
range when the question contains an explicit or computable temporal \
reference, and set its `confident` flag to false when unsure. The \
`semantic_query` must be a standalone rephrasing of the question's \
information need. Respond with JSON conforming to the provided schema.";

/// Translates questions into executable query plans.
pub struct QueryPlanner {
    backend: Arc<dyn CompletionBackend>,
}

impl QueryPlanner {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Plan a question against a tenant's corpus facts.
    ///
    /// A blank question fails with [`Error::InvalidInput`] before any
    /// provider call; an unusable provider response fails with
    /// [`Error::PlanningFailed`].
    #[instrument(skip(self, question, context), fields(
        subsystem = "ask",
        component = "planner",
        op = "plan",
        model = %self.backend.model_name(),
    ))]
    pub async fn plan(&self, question: &str, context: &PlannerContext) -> Result<QueryPlan> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }

        let prompt = build_prompt(question, context);
        let schema = RawQueryPlan::response_schema();
        // Stage identity is part of the error contract: a failed provider
        // call is a planning failure, not a bare transport error.
        let response = self
            .backend
            .complete(PLANNER_SYSTEM, &prompt, &schema)
            .await
            .map_err(|e| Error::PlanningFailed(format!("provider call failed: {}", e)))?;

        let raw: RawQueryPlan = serde_json::from_value(response)
            .map_err(|e| Error::PlanningFailed(format!("unparseable plan: {}", e)))?;
        let plan = finalize(raw, question, context);
        debug!(
            intent = %plan.intent,
            keyword_count = plan.keywords.len(),
            has_time_range = plan.time_range.is_some(),
            limit = plan.limit,
            "plan ready"
        );
        Ok(plan)
    }
}

fn build_prompt(question: &str, context: &PlannerContext) -> String {
    let tags = if context.known_tags.is_empty() {
        "(none)".to_string()
    } else {
        context.known_tags.join(", ")
    };
    let folders = if context.known_folders.is_empty() {
        "(none)".to_string()
    } else {
        context.known_folders.join(", ")
    };
    format!(
        "Today's date: {}\n\nTags in this collection: {}\n\nFolders in this \
         collection: {}\n\nQuestion: {}",
        context.reference_date, tags, folders, question
    )
}

/// Turn the provider's raw plan into a validated one.
fn finalize(raw: RawQueryPlan, question: &str, context: &PlannerContext) -> QueryPlan {
    let time_range = raw
        .time_range
        .as_ref()
        .and_then(|r| resolve_time_range(r, context.reference_date));

    let include_tags = prune_unknown(raw.include_tags, &context.known_tags, "tag");
    let exclude_tags = prune_unknown(raw.exclude_tags, &context.known_tags, "tag");
    let folders = raw.folders.and_then(|f| {
        let kept = prune_unknown(f, &context.known_folders, "folder");
        if kept.is_empty() {
            None
        } else {
            Some(kept)
        }
    });

    let mut keywords: Vec<String> = raw
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    keywords.dedup();

    let semantic_query = {
        let q = raw.semantic_query.trim();
        if q.is_empty() {
            question.to_string()
        } else {
            q.to_string()
        }
    };

    QueryPlan {
        intent: raw.intent,
        time_range,
        include_tags,
        exclude_tags,
        folders,
        keywords,
        semantic_query,
        limit: QueryPlan::clamp_limit(raw.limit, context.max_results),
    }
}

fn prune_unknown(proposed: Vec<String>, known: &[String], kind: &str) -> Vec<String> {
    let mut kept = Vec::with_capacity(proposed.len());
    for value in proposed {
        if known.iter().any(|k| k == &value) {
            if !kept.contains(&value) {
                kept.push(value);
            }
        } else {
            warn!(value = %value, kind, "dropping filter value not present in corpus");
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{QueryIntent, RawTimeRange};

    fn context() -> PlannerContext {
        PlannerContext::new(
            vec!["travel".to_string(), "recipes".to_string()],
            vec!["work".to_string(), "journal".to_string()],
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        )
    }

    fn raw_plan() -> RawQueryPlan {
        RawQueryPlan {
            intent: QueryIntent::FactLookup,
            time_range: None,
            include_tags: vec![],
            exclude_tags: vec![],
            folders: None,
            keywords: vec![],
            semantic_query: "something".to_string(),
            limit: None,
        }
    }

    #[test]
    fn unknown_tags_and_folders_are_pruned() {
        let mut raw = raw_plan();
        raw.include_tags = vec!["travel".to_string(), "hallucinated".to_string()];
        raw.folders = Some(vec!["imaginary".to_string()]);

        let plan = finalize(raw, "q", &context());
        assert_eq!(plan.include_tags, vec!["travel".to_string()]);
        // All proposed folders were unknown: the filter disappears rather
        // than becoming an empty list that matches nothing.
        assert!(plan.folders.is_none());
    }

    #[test]
    fn unconfident_time_range_is_dropped() {
        let mut raw = raw_plan();
        raw.time_range = Some(RawTimeRange {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            month: None,
            year: None,
            timezone: None,
            confident: false,
        });
        let plan = finalize(raw, "q", &context());
        assert!(plan.time_range.is_none());
    }

    #[test]
    fn bare_month_resolves_against_reference_date() {
        let mut raw = raw_plan();
        raw.time_range = Some(RawTimeRange {
            start_date: None,
            end_date: None,
            month: Some(3),
            year: None,
            timezone: None,
            confident: true,
        });
        let plan = finalize(raw, "q", &context());
        let range = plan.time_range.unwrap();
        // June 2025 reference: "March" means March 2025.
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 3, 31));
    }

    #[test]
    fn blank_semantic_query_falls_back_to_question() {
        let mut raw = raw_plan();
        raw.semantic_query = "   ".to_string();
        let plan = finalize(raw, "what did I cook in May?", &context());
        assert_eq!(plan.semantic_query, "what did I cook in May?");
    }

    #[test]
    fn limit_is_clamped() {
        let mut raw = raw_plan();
        raw.limit = Some(9999);
        let plan = finalize(raw, "q", &context());
        assert_eq!(plan.limit, MAX_RESULT_LIMIT);

        let mut raw = raw_plan();
        raw.limit = None;
        let plan = finalize(raw, "q", &context());
        assert_eq!(plan.limit, 12);
    }

    #[test]
    fn keywords_are_trimmed_and_deduped() {
        let mut raw = raw_plan();
        raw.keywords = vec![
            " sourdough ".to_string(),
            "sourdough".to_string(),
            "".to_string(),
        ];
        let plan = finalize(raw, "q", &context());
        assert_eq!(plan.keywords, vec!["sourdough".to_string()]);
    }

    #[test]
    fn prompt_lists_corpus_facts() {
        let prompt = build_prompt("where did I stay in Lisbon?", &context());
        assert!(prompt.contains("2025-06-15"));
        assert!(prompt.contains("travel, recipes"));
        assert!(prompt.contains("work, journal"));
        assert!(prompt.contains("Lisbon"));
    }
}
