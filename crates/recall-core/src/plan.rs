//! Query plan model: the structured, validated representation of a
//! natural-language question's retrieval intent.
//!
//! Two layers exist on purpose. [`RawQueryPlan`] is the schema handed to the
//! text-completion provider (it derives [`schemars::JsonSchema`] and carries
//! unresolved temporal fields plus a confidence flag). [`QueryPlan`] is the
//! validated form the Retrieval Engine executes; it is produced from the raw
//! plan by the planner's post-processing and never contains an unconfident
//! time filter.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::defaults::{DEFAULT_RESULT_LIMIT, MAX_RESULT_LIMIT};

/// Retrieval intent of a question.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Look up a specific fact ("what was the wifi password at the cabin?")
    #[default]
    FactLookup,
    /// Summarize a topic across notes
    Summary,
    /// Describe how something evolved over time
    Trend,
    /// Enumerate matching items
    List,
    /// Reconstruct an ordered sequence of events
    Timeline,
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FactLookup => write!(f, "fact_lookup"),
            Self::Summary => write!(f, "summary"),
            Self::Trend => write!(f, "trend"),
            Self::List => write!(f, "list"),
            Self::Timeline => write!(f, "timeline"),
        }
    }
}

/// Resolved, confident time filter on `created_at`.
///
/// Both bounds are inclusive. A range may be open on one side ("since
/// March"), never on both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// IANA timezone the dates were anchored in, when the question implied
    /// one. Filtering treats dates as UTC day boundaries otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl TimeRange {
    /// True when the range cannot match anything (start after end).
    /// Retrieval treats such a range as an empty eligible set, not an error.
    pub fn is_empty(&self) -> bool {
        match (self.start, self.end) {
            (Some(s), Some(e)) => s > e,
            _ => false,
        }
    }
}

/// Validated retrieval plan, ready for execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPlan {
    pub intent: QueryIntent,
    /// Present only when the question carried a resolvable, confident
    /// temporal reference. Never defaulted to "all time" or "today".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// OR semantics: a note matches if it has any of these tags.
    pub include_tags: Vec<String>,
    /// AND-NOT semantics: a note with any of these tags is excluded.
    pub exclude_tags: Vec<String>,
    /// Folder prefix filters; `None` means unrestricted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<String>>,
    /// Ordered keyword phrases for full-text search. May be empty.
    pub keywords: Vec<String>,
    /// Standalone query string used for embedding. Never empty.
    pub semantic_query: String,
    /// Result limit, always within [1, MAX_RESULT_LIMIT].
    pub limit: i64,
}

impl QueryPlan {
    /// Clamp a proposed limit into the valid range, treating the
    /// caller-supplied ceiling as authoritative.
    pub fn clamp_limit(proposed: Option<i64>, ceiling: i64) -> i64 {
        let ceiling = ceiling.clamp(1, MAX_RESULT_LIMIT);
        proposed.unwrap_or(DEFAULT_RESULT_LIMIT).clamp(1, ceiling)
    }
}

/// Unresolved time range as reported by the completion provider.
///
/// The provider fills explicit dates when the question states them, or a
/// month (optionally with a year) for references like "in March". The
/// `confident` flag gates the whole range: the planner drops anything the
/// provider was not sure about.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawTimeRange {
    /// Explicit inclusive start date (ISO 8601), if stated.
    pub start_date: Option<NaiveDate>,
    /// Explicit inclusive end date (ISO 8601), if stated.
    pub end_date: Option<NaiveDate>,
    /// Month number 1-12 for bare month references ("in March").
    pub month: Option<u32>,
    /// Year, when the question states one.
    pub year: Option<i32>,
    /// IANA timezone implied by the question, if any.
    pub timezone: Option<String>,
    /// Whether the temporal reference is explicit or computably relative.
    /// False means the range is discarded entirely.
    #[serde(default)]
    pub confident: bool,
}

/// Plan shape the completion provider is constrained to return.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawQueryPlan {
    pub intent: QueryIntent,
    pub time_range: Option<RawTimeRange>,
    #[serde(default)]
    pub include_tags: Vec<String>,
    #[serde(default)]
    pub exclude_tags: Vec<String>,
    pub folders: Option<Vec<String>>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub semantic_query: String,
    pub limit: Option<i64>,
}

impl RawQueryPlan {
    /// JSON schema handed to the completion provider as the response format.
    pub fn response_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(RawQueryPlan);
        serde_json::to_value(schema.schema).unwrap_or(serde_json::Value::Null)
    }
}
