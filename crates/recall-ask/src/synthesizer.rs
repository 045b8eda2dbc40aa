//! Answer synthesizer: retrieved notes in, cited markdown answer out.
//!
//! The provider only ever sees the retrieved notes, each labelled with its
//! id; it is instructed to cite by id and to admit when the notes do not
//! answer the question. Returned citations are still filtered post hoc,
//! since a citation pointing outside the retrieved set would let a
//! confabulated source masquerade as evidence.

use std::collections::HashSet;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use recall_core::{CompletionBackend, Error, Note, QueryPlan, Result};

/// Maximum note content characters included per source. Keeps the prompt
/// bounded for large notes.
const MAX_SOURCE_CHARS: usize = 2000;

const SYNTHESIS_SYSTEM: &str = "You answer questions using only the provided \
notes. Write the answer in markdown. Cite every claim by putting the \
supporting note's id into `cited_note_ids`; never cite a note that is not \
listed in the prompt. If the notes do not contain the answer, say so \
plainly instead of guessing. Suggest up to three short follow-up questions \
the notes could answer. Respond with JSON conforming to the provided \
schema.";

/// Shape the provider is constrained to return.
#[derive(Debug, Deserialize, JsonSchema)]
struct AnswerResponse {
    answer_markdown: String,
    #[serde(default)]
    cited_note_ids: Vec<Uuid>,
    #[serde(default)]
    followups: Vec<String>,
}

/// A synthesized, citation-checked answer.
#[derive(Debug, Clone)]
pub struct SynthesizedAnswer {
    pub answer_markdown: String,
    /// Always a subset of the note ids that were handed to the provider.
    pub cited_note_ids: Vec<Uuid>,
    pub followups: Vec<String>,
}

/// Writes grounded answers from retrieved notes.
pub struct AnswerSynthesizer {
    backend: Arc<dyn CompletionBackend>,
}

impl AnswerSynthesizer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Synthesize an answer to `question` from the retrieved notes.
    ///
    /// An empty source list still produces an answer (the provider is told
    /// nothing matched); an unusable provider response fails with
    /// [`Error::SynthesisFailed`].
    #[instrument(skip(self, question, plan, sources), fields(
        subsystem = "ask",
        component = "synthesizer",
        op = "synthesize",
        model = %self.backend.model_name(),
        source_count = sources.len(),
    ))]
    pub async fn synthesize(
        &self,
        question: &str,
        plan: &QueryPlan,
        sources: &[Note],
    ) -> Result<SynthesizedAnswer> {
        let prompt = build_prompt(question, plan, sources);
        let schema = schema();
        // A failed provider call is a synthesis failure, not a bare
        // transport error.
        let response = self
            .backend
            .complete(SYNTHESIS_SYSTEM, &prompt, &schema)
            .await
            .map_err(|e| Error::SynthesisFailed(format!("provider call failed: {}", e)))?;

        let parsed: AnswerResponse = serde_json::from_value(response)
            .map_err(|e| Error::SynthesisFailed(format!("unparseable answer: {}", e)))?;
        if parsed.answer_markdown.trim().is_empty() {
            return Err(Error::SynthesisFailed("empty answer".to_string()));
        }

        let retrieved: HashSet<Uuid> = sources.iter().map(|n| n.id).collect();
        let mut cited = Vec::with_capacity(parsed.cited_note_ids.len());
        for id in parsed.cited_note_ids {
            if !retrieved.contains(&id) {
                warn!(note_id = %id, "dropping citation outside the retrieved set");
            } else if !cited.contains(&id) {
                cited.push(id);
            }
        }

        debug!(
            response_len = parsed.answer_markdown.len(),
            citation_count = cited.len(),
            "answer ready"
        );
        Ok(SynthesizedAnswer {
            answer_markdown: parsed.answer_markdown,
            cited_note_ids: cited,
            followups: parsed.followups,
        })
    }
}

fn schema() -> serde_json::Value {
    let schema = schemars::schema_for!(AnswerResponse);
    serde_json::to_value(schema.schema).unwrap_or(serde_json::Value::Null)
}

fn build_prompt(question: &str, plan: &QueryPlan, sources: &[Note]) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("Question: {}\nIntent: {}\n\n", question, plan.intent));

    if sources.is_empty() {
        prompt.push_str("No notes matched this question.\n");
        return prompt;
    }

    prompt.push_str("Notes:\n\n");
    for note in sources {
        let mut content: String = note.content.chars().take(MAX_SOURCE_CHARS).collect();
        if content.len() < note.content.len() {
            content.push('…');
        }
        prompt.push_str(&format!(
            "[{}] {} (updated {})\n{}\n\n",
            note.id,
            note.title,
            note.updated_at.date_naive(),
            content
        ));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recall_core::QueryIntent;

    fn sample_note(title: &str, content: &str) -> Note {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            folder: None,
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_plan() -> QueryPlan {
        QueryPlan {
            intent: QueryIntent::Summary,
            time_range: None,
            include_tags: vec![],
            exclude_tags: vec![],
            folders: None,
            keywords: vec![],
            semantic_query: "q".to_string(),
            limit: 12,
        }
    }

    #[test]
    fn prompt_labels_each_source_with_its_id() {
        let notes = vec![sample_note("Cabin trip", "wifi: hunter2")];
        let prompt = build_prompt("what was the wifi password?", &sample_plan(), &notes);
        assert!(prompt.contains(&notes[0].id.to_string()));
        assert!(prompt.contains("Cabin trip"));
        assert!(prompt.contains("Intent: summary"));
    }

    #[test]
    fn prompt_says_when_nothing_matched() {
        let prompt = build_prompt("anything?", &sample_plan(), &[]);
        assert!(prompt.contains("No notes matched"));
    }

    #[test]
    fn long_content_is_truncated() {
        let long = "x".repeat(MAX_SOURCE_CHARS * 2);
        let notes = vec![sample_note("big", &long)];
        let prompt = build_prompt("q", &sample_plan(), &notes);
        assert!(prompt.len() < long.len());
        assert!(prompt.contains('…'));
    }

    #[test]
    fn answer_schema_names_required_fields() {
        let schema = schema();
        let props = schema
            .get("properties")
            .and_then(|p| p.as_object())
            .expect("schema has properties");
        assert!(props.contains_key("answer_markdown"));
        assert!(props.contains_key("cited_note_ids"));
        assert!(props.contains_key("followups"));
    }
}
