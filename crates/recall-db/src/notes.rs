//! Tenant-scoped document store implementation.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use recall_core::{DocumentFilter, DocumentStore, Error, Note, Result};

use crate::escape_like;

/// PostgreSQL implementation of [`DocumentStore`].
///
/// Every statement binds the tenant id; cross-tenant rows are structurally
/// unreachable.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new PgDocumentStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_note(row: &sqlx::postgres::PgRow) -> Note {
        Note {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            title: row.get("title"),
            content: row.get("content"),
            folder: row.get("folder"),
            tags: row.get("tags"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self, filter), fields(
        subsystem = "db",
        component = "documents",
        op = "list",
        tenant_id = %tenant_id,
    ))]
    async fn list(&self, tenant_id: Uuid, filter: &DocumentFilter) -> Result<Vec<Note>> {
        // Folder prefix match: "work" matches "work" and "work/…" but not
        // "workshop". Exact values and LIKE-escaped prefixes bind as
        // parallel arrays.
        let (folder_exact, folder_prefix): (Option<Vec<String>>, Option<Vec<String>>) =
            match &filter.folders {
                Some(folders) => (
                    Some(folders.clone()),
                    Some(folders.iter().map(|f| escape_like(f)).collect()),
                ),
                None => (None, None),
            };

        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, title, content, folder, tags, created_at, updated_at
            FROM note n
            WHERE n.tenant_id = $1
              AND ($2::text[] IS NULL OR EXISTS (
                    SELECT 1 FROM unnest($2::text[], $3::text[]) AS t(f, fp)
                    WHERE n.folder = f OR n.folder LIKE fp || '/%' ESCAPE '\'))
              AND (cardinality($4::text[]) = 0 OR n.tags && $4::text[])
              AND (cardinality($5::text[]) = 0 OR NOT (n.tags && $5::text[]))
              AND ($6::timestamptz IS NULL OR n.created_at >= $6)
              AND ($7::timestamptz IS NULL OR n.created_at < $7)
            ORDER BY n.updated_at DESC, n.id
            "#,
        )
        .bind(tenant_id)
        .bind(&folder_exact)
        .bind(&folder_prefix)
        .bind(&filter.include_tags)
        .bind(&filter.exclude_tags)
        .bind(filter.created_after)
        .bind(filter.created_before)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::row_to_note).collect())
    }

    async fn get(&self, tenant_id: Uuid, note_id: Uuid) -> Result<Option<Note>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, title, content, folder, tags, created_at, updated_at
            FROM note
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::row_to_note))
    }
}
