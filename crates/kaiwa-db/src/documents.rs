//! Document corpus read access.
//!
//! Documents are written by the external upload/extraction collaborator;
//! this repository is the read-only view the context assembly pipeline uses.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use kaiwa_core::{Document, DocumentRepository, Result};

/// PostgreSQL implementation of [`DocumentRepository`].
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn processed_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, original_name, extracted_text, processed
            FROM documents
            WHERE owner_id = $1 AND processed = TRUE
            ORDER BY uploaded_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Document {
                    id: row.try_get("id")?,
                    owner_id: row.try_get("owner_id")?,
                    original_name: row.try_get("original_name")?,
                    extracted_text: row.try_get("extracted_text")?,
                    processed: row.try_get("processed")?,
                })
            })
            .collect()
    }
}
