//! # recall-core
//!
//! Core types, traits, and abstractions for recall.
//!
//! This crate provides the foundational data structures, the port traits
//! that adapters implement, and the pure helper modules (similarity math,
//! temporal resolution) that the rest of the workspace depends on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod plan;
pub mod similarity;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use plan::{QueryIntent, QueryPlan, RawQueryPlan, RawTimeRange, TimeRange};
pub use similarity::{
    content_hash, cosine_similarity, decode_vector, encode_vector, normalize_similarity,
    validate_embedding,
};
pub use temporal::resolve_time_range;
pub use traits::*;
