//! Full-text index implementation using PostgreSQL tsvector ranking.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use recall_core::defaults::SNIPPET_LENGTH;
use recall_core::{Error, FullTextIndex, KeywordMatch, Result};

/// PostgreSQL implementation of [`FullTextIndex`].
///
/// Field-weighted ranking: title (weight A) > tags (B) > content (C),
/// combined with `ts_rank` normalization flag 32 for BM25-like behavior.
/// Scores are comparable within one call only.
#[derive(Clone)]
pub struct PgFullTextIndex {
    pool: PgPool,
}

impl PgFullTextIndex {
    /// Create a new PgFullTextIndex with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FullTextIndex for PgFullTextIndex {
    #[instrument(skip(self, keywords, candidates), fields(
        subsystem = "db",
        component = "fts",
        op = "search",
        tenant_id = %tenant_id,
    ))]
    async fn search(
        &self,
        tenant_id: Uuid,
        keywords: &[String],
        candidates: Option<&[Uuid]>,
        limit: i64,
    ) -> Result<Vec<KeywordMatch>> {
        let query = keywords.join(" ").trim().to_string();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let candidate_ids: Option<Vec<Uuid>> = candidates.map(|ids| ids.to_vec());

        let rows = sqlx::query(
            r#"
            SELECT n.id AS note_id,
                   ts_rank(
                       setweight(to_tsvector('english', coalesce(n.title, '')), 'A') ||
                       setweight(to_tsvector('english', array_to_string(n.tags, ' ')), 'B') ||
                       setweight(to_tsvector('english', n.content), 'C'),
                       websearch_to_tsquery('english', $2),
                       32
                   ) AS score,
                   left(n.content, $4) AS snippet
            FROM note n
            WHERE n.tenant_id = $1
              AND ($3::uuid[] IS NULL OR n.id = ANY($3::uuid[]))
              AND (
                   setweight(to_tsvector('english', coalesce(n.title, '')), 'A') ||
                   setweight(to_tsvector('english', array_to_string(n.tags, ' ')), 'B') ||
                   setweight(to_tsvector('english', n.content), 'C')
                  ) @@ websearch_to_tsquery('english', $2)
            ORDER BY score DESC, n.id
            LIMIT $5
            "#,
        )
        .bind(tenant_id)
        .bind(&query)
        .bind(&candidate_ids)
        .bind(SNIPPET_LENGTH as i32)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| KeywordMatch {
                note_id: row.get("note_id"),
                score: row.get::<Option<f32>, _>("score").unwrap_or(0.0),
                snippet: row.get("snippet"),
            })
            .collect())
    }
}
