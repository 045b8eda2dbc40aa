//! Ask history persistence.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::debug;

use recall_core::{AskHistoryStore, AskRecord, Error, Result};

/// PostgreSQL implementation of [`AskHistoryStore`].
///
/// Append-only: records are written exactly once after synthesis succeeds
/// and never updated.
#[derive(Clone)]
pub struct PgAskHistoryStore {
    pool: PgPool,
}

impl PgAskHistoryStore {
    /// Create a new PgAskHistoryStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AskHistoryStore for PgAskHistoryStore {
    async fn append(&self, record: &AskRecord) -> Result<()> {
        let cited = serde_json::to_value(&record.cited_note_ids)?;

        sqlx::query(
            r#"
            INSERT INTO ask_history
                (id, tenant_id, query, query_plan, answer_markdown,
                 cited_note_ids, source_scores, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.tenant_id)
        .bind(&record.query)
        .bind(&record.plan)
        .bind(&record.answer_markdown)
        .bind(cited)
        .bind(&record.source_scores)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "history",
            op = "append",
            tenant_id = %record.tenant_id,
            ask_id = %record.id,
            "Ask history entry persisted"
        );
        Ok(())
    }
}
