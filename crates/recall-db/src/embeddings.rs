//! Embedding repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use recall_core::{EmbeddingRepository, Error, NoteEmbedding, Result, Vector};

/// PostgreSQL implementation of [`EmbeddingRepository`].
///
/// The `(tenant_id, note_id, model)` primary key carries the uniqueness
/// invariant; upsert replaces vector and content hash in one statement so
/// concurrent writers resolve to last-write-wins without torn rows.
#[derive(Clone)]
pub struct PgEmbeddingRepository {
    pool: PgPool,
}

impl PgEmbeddingRepository {
    /// Create a new PgEmbeddingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_embedding(row: &sqlx::postgres::PgRow) -> NoteEmbedding {
        NoteEmbedding {
            tenant_id: row.get("tenant_id"),
            note_id: row.get("note_id"),
            model: row.get("model"),
            content_hash: row.get("content_hash"),
            vector: row.get("vector"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl EmbeddingRepository for PgEmbeddingRepository {
    async fn upsert(
        &self,
        tenant_id: Uuid,
        note_id: Uuid,
        model: &str,
        content_hash: &str,
        vector: &Vector,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO note_embedding
                (tenant_id, note_id, model, content_hash, vector, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            ON CONFLICT (tenant_id, note_id, model)
            DO UPDATE SET vector = EXCLUDED.vector,
                          content_hash = EXCLUDED.content_hash,
                          updated_at = now()
            "#,
        )
        .bind(tenant_id)
        .bind(note_id)
        .bind(model)
        .bind(content_hash)
        .bind(vector)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        note_id: Uuid,
        model: &str,
    ) -> Result<Option<NoteEmbedding>> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, note_id, model, content_hash, vector, created_at, updated_at
            FROM note_embedding
            WHERE tenant_id = $1 AND note_id = $2 AND model = $3
            "#,
        )
        .bind(tenant_id)
        .bind(note_id)
        .bind(model)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::row_to_embedding))
    }

    async fn get_many(
        &self,
        tenant_id: Uuid,
        note_ids: &[Uuid],
        model: &str,
    ) -> Result<HashMap<Uuid, NoteEmbedding>> {
        if note_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT tenant_id, note_id, model, content_hash, vector, created_at, updated_at
            FROM note_embedding
            WHERE tenant_id = $1 AND note_id = ANY($2::uuid[]) AND model = $3
            "#,
        )
        .bind(tenant_id)
        .bind(note_ids)
        .bind(model)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| {
                let embedding = Self::row_to_embedding(row);
                (embedding.note_id, embedding)
            })
            .collect())
    }
}
