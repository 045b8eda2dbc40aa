//! Structured logging schema and field name constants for recall.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, defensive filtering applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (hits, scores) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "ask", "search", "db", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "planner", "retrieval_engine", "synthesizer", "ollama", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "plan", "retrieve", "answer", "embed_texts", "complete"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Tenant UUID the operation is scoped to.
pub const TENANT_ID: &str = "tenant_id";

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Question text driving an ask request.
pub const QUESTION: &str = "question";

/// Pipeline stage ("planning", "embedding", "retrieving", "synthesizing",
/// "persisting") attached to orchestrator events.
pub const STAGE: &str = "stage";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a prompt sent to a provider.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a provider response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Retrieval fields ──────────────────────────────────────────────────────

/// Size of the eligible set after structural filtering.
pub const ELIGIBLE_COUNT: &str = "eligible_count";

/// Number of keyword matches before fusion.
pub const KEYWORD_HITS: &str = "keyword_hits";

/// Number of documents with a semantic score before fusion.
pub const SEMANTIC_HITS: &str = "semantic_hits";

/// Keyword weight used in score fusion.
pub const KEYWORD_WEIGHT: &str = "keyword_weight";

/// Semantic weight used in score fusion.
pub const SEMANTIC_WEIGHT: &str = "semantic_weight";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model slug used for a provider call.
pub const MODEL: &str = "model";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";
