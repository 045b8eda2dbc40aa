//! Deterministic offline backend for tests.
//!
//! Embeddings are derived from a SHA-256 digest of the input text, so the
//! same text always maps to the same vector and different texts land far
//! apart. Completions are served from a queue or a prompt-substring map,
//! never from a model.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use recall_core::{CompletionBackend, EmbeddingBackend, Error, Result, Vector};

/// One recorded backend invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Default)]
struct MockState {
    queued_completions: VecDeque<serde_json::Value>,
    mapped_completions: HashMap<String, serde_json::Value>,
    fail_embeddings: bool,
    fail_completions: bool,
    calls: Vec<MockCall>,
}

/// Mock backend implementing both provider ports.
#[derive(Clone)]
pub struct MockBackend {
    dimension: usize,
    embed_model: String,
    gen_model: String,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            dimension: 8,
            embed_model: "mock-embed".to_string(),
            gen_model: "mock-gen".to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Queue a completion response; queued responses are served in order
    /// before any mapping is consulted.
    pub fn queue_completion(&self, response: serde_json::Value) {
        self.state
            .lock()
            .expect("mock state poisoned")
            .queued_completions
            .push_back(response);
    }

    /// Serve `response` whenever the prompt contains `needle`.
    pub fn map_completion(&self, needle: impl Into<String>, response: serde_json::Value) {
        self.state
            .lock()
            .expect("mock state poisoned")
            .mapped_completions
            .insert(needle.into(), response);
    }

    /// Make every embedding call fail until reset.
    pub fn fail_embeddings(&self, fail: bool) {
        self.state.lock().expect("mock state poisoned").fail_embeddings = fail;
    }

    /// Make every completion call fail until reset.
    pub fn fail_completions(&self, fail: bool) {
        self.state.lock().expect("mock state poisoned").fail_completions = fail;
    }

    /// All recorded invocations, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().expect("mock state poisoned").calls.clone()
    }

    /// Number of embedding invocations.
    pub fn embed_call_count(&self) -> usize {
        self.calls().iter().filter(|c| c.operation == "embed").count()
    }

    /// Number of completion invocations.
    pub fn completion_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation == "complete")
            .count()
    }

    fn log(&self, operation: &str, input: &str) {
        self.state
            .lock()
            .expect("mock state poisoned")
            .calls
            .push(MockCall {
                operation: operation.to_string(),
                input: input.to_string(),
            });
    }

    fn deterministic_vector(&self, text: &str) -> Vector {
        let digest = Sha256::digest(text.as_bytes());
        let values: Vec<f32> = (0..self.dimension)
            .map(|i| {
                let byte = digest[i % digest.len()];
                // Mix the position in so long vectors don't just repeat.
                let mixed = byte.wrapping_add((i / digest.len()) as u8 * 31);
                (mixed as f32 / 127.5) - 1.0
            })
            .collect();
        Vector::from(values)
    }
}

#[async_trait]
impl EmbeddingBackend for MockBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        for text in texts {
            self.log("embed", text);
        }
        if self.state.lock().expect("mock state poisoned").fail_embeddings {
            return Err(Error::Embedding("mock embedding failure".to_string()));
        }
        Ok(texts.iter().map(|t| self.deterministic_vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(
        &self,
        _system: &str,
        prompt: &str,
        _response_schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.log("complete", prompt);
        let mut state = self.state.lock().expect("mock state poisoned");
        if state.fail_completions {
            return Err(Error::Request("mock completion failure".to_string()));
        }
        if let Some(queued) = state.queued_completions.pop_front() {
            return Ok(queued);
        }
        if let Some((_, response)) = state
            .mapped_completions
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
        {
            return Ok(response.clone());
        }
        Err(Error::Request(format!(
            "mock has no completion configured for prompt: {}",
            prompt.chars().take(80).collect::<String>()
        )))
    }

    fn model_name(&self) -> &str {
        &self.gen_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embeddings_are_deterministic_per_text() {
        let backend = MockBackend::new().with_dimension(16);
        let a = backend.embed_texts(&["hello".to_string()]).await.unwrap();
        let b = backend.embed_texts(&["hello".to_string()]).await.unwrap();
        let c = backend.embed_texts(&["goodbye".to_string()]).await.unwrap();

        assert_eq!(a[0].as_slice(), b[0].as_slice());
        assert_ne!(a[0].as_slice(), c[0].as_slice());
        assert_eq!(a[0].as_slice().len(), 16);
    }

    #[tokio::test]
    async fn embedding_values_are_finite_and_bounded() {
        let backend = MockBackend::new().with_dimension(100);
        let vectors = backend.embed_texts(&["text".to_string()]).await.unwrap();
        assert!(vectors[0]
            .as_slice()
            .iter()
            .all(|v| v.is_finite() && (-1.0..=1.0).contains(v)));
    }

    #[tokio::test]
    async fn queued_completions_serve_in_order() {
        let backend = MockBackend::new();
        backend.queue_completion(serde_json::json!({"n": 1}));
        backend.queue_completion(serde_json::json!({"n": 2}));

        let schema = serde_json::json!({});
        let first = backend.complete("", "p", &schema).await.unwrap();
        let second = backend.complete("", "p", &schema).await.unwrap();
        assert_eq!(first["n"], 1);
        assert_eq!(second["n"], 2);
    }

    #[tokio::test]
    async fn mapped_completion_matches_prompt_substring() {
        let backend = MockBackend::new();
        backend.map_completion("wifi password", serde_json::json!({"found": true}));

        let schema = serde_json::json!({});
        let out = backend
            .complete("", "what was the wifi password?", &schema)
            .await
            .unwrap();
        assert_eq!(out["found"], true);
    }

    #[tokio::test]
    async fn failure_switches_apply_and_reset() {
        let backend = MockBackend::new();
        backend.fail_embeddings(true);
        assert!(backend.embed_texts(&["t".to_string()]).await.is_err());
        backend.fail_embeddings(false);
        assert!(backend.embed_texts(&["t".to_string()]).await.is_ok());
    }

    #[tokio::test]
    async fn call_log_records_operations() {
        let backend = MockBackend::new();
        backend.queue_completion(serde_json::json!({}));
        let _ = backend.embed_texts(&["a".to_string()]).await;
        let _ = backend.complete("", "b", &serde_json::json!({})).await;

        assert_eq!(backend.embed_call_count(), 1);
        assert_eq!(backend.completion_call_count(), 1);
        assert_eq!(backend.calls()[1].input, "b");
    }
}
