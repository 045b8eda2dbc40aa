//! # recall-inference
//!
//! Provider backends for recall.
//!
//! Two implementations of the embedding and completion ports:
//! - [`ollama::OllamaBackend`] talks to a local Ollama server
//!   (`/api/embed` for vectors, `/api/chat` with schema-constrained JSON
//!   output for completions)
//! - [`mock::MockBackend`] is deterministic and offline, for tests

pub mod mock;
pub mod ollama;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
