//! # recall-db
//!
//! PostgreSQL adapter layer for recall.
//!
//! This crate provides:
//! - Connection pool management
//! - Tenant-scoped Postgres implementations of the core ports
//!   (document store, full-text index, embedding repository, ask history)
//! - Always-compiled in-memory implementations of the same ports, used by
//!   integration tests across the workspace
//!
//! ## Example
//!
//! ```rust,ignore
//! use recall_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/recall").await?;
//!     let note = db.documents.get(tenant_id, note_id).await?;
//!     Ok(())
//! }
//! ```

pub mod embeddings;
pub mod fts;
pub mod history;
pub mod memory;
pub mod notes;
pub mod pool;

// Re-export core types
pub use recall_core::*;

pub use embeddings::PgEmbeddingRepository;
pub use fts::PgFullTextIndex;
pub use history::PgAskHistoryStore;
pub use memory::MemoryStore;
pub use notes::PgDocumentStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

use sqlx::postgres::PgPool;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Aggregated handle over all Postgres port implementations sharing one
/// connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    pub documents: PgDocumentStore,
    pub fts: PgFullTextIndex,
    pub embeddings: PgEmbeddingRepository,
    pub history: PgAskHistoryStore,
}

impl Database {
    /// Connect with default pool settings.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::with_pool(pool))
    }

    /// Build from an existing pool.
    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            documents: PgDocumentStore::new(pool.clone()),
            fts: PgFullTextIndex::new(pool.clone()),
            embeddings: PgEmbeddingRepository::new(pool.clone()),
            history: PgAskHistoryStore::new(pool.clone()),
            pool,
        }
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))
    }
}
