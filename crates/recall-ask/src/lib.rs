//! # recall-ask
//!
//! The question answering pipeline: turn a natural-language question over
//! a tenant's notes into a cited markdown answer.
//!
//! Stages, in order:
//! 1. Planning: the completion provider translates the question into a
//!    validated [`recall_core::QueryPlan`]
//! 2. Query embedding: the plan's semantic query becomes a vector
//! 3. Retrieval: the hybrid engine ranks the tenant's notes
//! 4. Synthesis: the provider writes a grounded, cited answer
//! 5. History: the completed interaction is persisted exactly once
//!
//! Any stage failing aborts the pipeline; nothing is persisted for a
//! failed ask.

pub mod orchestrator;
pub mod planner;
pub mod synthesizer;

pub use orchestrator::{AskOutcome, AskPipeline};
pub use planner::{PlannerContext, QueryPlanner};
pub use synthesizer::{AnswerSynthesizer, SynthesizedAnswer};
