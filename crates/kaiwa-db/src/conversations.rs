//! Conversation memory repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use kaiwa_core::{ConversationRepository, MemoryTurn, Result, TurnRole};

/// PostgreSQL implementation of [`ConversationRepository`].
///
/// Turns are rows in `conversation_turns`, keyed by owner; the serial id
/// doubles as insertion order, which is the only ordering the contract
/// guarantees.
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn window(&self, owner_id: Uuid, limit: i64) -> Result<Vec<MemoryTurn>> {
        let rows = sqlx::query(
            r#"
            SELECT role, content
            FROM conversation_turns
            WHERE owner_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut turns = rows
            .iter()
            .map(|row| {
                let role: String = row.try_get("role")?;
                Ok(MemoryTurn {
                    role: role.parse::<TurnRole>()?,
                    content: row.try_get("content")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn append_turn(&self, owner_id: Uuid, role: TurnRole, content: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO conversation_turns (owner_id, role, content) VALUES ($1, $2, $3)",
        )
        .bind(owner_id)
        .bind(role.to_string())
        .bind(content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, owner_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM conversation_turns WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
