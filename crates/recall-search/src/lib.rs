//! # recall-search
//!
//! Hybrid retrieval engine for recall.
//!
//! This crate provides:
//! - Weighted rank fusion of full-text and semantic similarity signals
//! - The retrieval engine executing a validated query plan against the
//!   storage ports
//! - The embedding store service (query embedding + hash-gated note
//!   indexing)
//!
//! ## Example
//!
//! ```ignore
//! use recall_search::{RetrievalConfig, RetrievalEngine};
//!
//! let engine = RetrievalEngine::new(documents, fts, embeddings, RetrievalConfig::default());
//! let hits = engine.retrieve(tenant_id, &plan, Some(&query_vector)).await?;
//! ```

pub mod engine;
pub mod fusion;
pub mod store;

pub use engine::{RetrievalConfig, RetrievalEngine};
pub use fusion::{fuse, max_normalize, FusionWeights, SignalScores};
pub use store::EmbeddingStore;
