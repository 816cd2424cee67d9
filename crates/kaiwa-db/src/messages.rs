//! Chat message repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use kaiwa_core::{
    Channel, ChatMessage, Error, MessageRepository, NewChatMessage, Result,
};

/// PostgreSQL implementation of [`MessageRepository`].
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::postgres::PgRow) -> Result<ChatMessage> {
    let channel: String = row.try_get("channel")?;
    Ok(ChatMessage {
        id: row.try_get("id")?,
        author_id: row.try_get("author_id")?,
        author_display_name: row.try_get("author_display_name")?,
        author_avatar_url: row.try_get("author_avatar_url")?,
        text: row.try_get("text")?,
        channel: channel.parse()?,
        deleted: row.try_get("deleted")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, msg: NewChatMessage) -> Result<ChatMessage> {
        let row = sqlx::query(
            r#"
            INSERT INTO chat_messages
                (id, author_id, author_display_name, author_avatar_url, text, channel, deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, now())
            RETURNING id, author_id, author_display_name, author_avatar_url,
                      text, channel, deleted, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(msg.author_id)
        .bind(&msg.author_display_name)
        .bind(&msg.author_avatar_url)
        .bind(&msg.text)
        .bind(msg.channel.to_string())
        .fetch_one(&self.pool)
        .await?;

        row_to_message(&row)
    }

    async fn find_recent(
        &self,
        channel: Channel,
        limit: i64,
        include_deleted: bool,
    ) -> Result<Vec<ChatMessage>> {
        // Newest-first window in SQL, reversed to oldest→newest for callers.
        let rows = sqlx::query(
            r#"
            SELECT id, author_id, author_display_name, author_avatar_url,
                   text, channel, deleted, created_at
            FROM chat_messages
            WHERE channel = $1
              AND ($2 OR deleted = FALSE)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(channel.to_string())
        .bind(include_deleted)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages: Vec<ChatMessage> = rows
            .iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn mark_deleted(&self, message_id: Uuid, requester_id: Uuid) -> Result<ChatMessage> {
        let row = sqlx::query("SELECT author_id FROM chat_messages WHERE id = $1")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("message {}", message_id)))?;

        let author_id: Uuid = row.try_get("author_id")?;
        if author_id != requester_id {
            return Err(Error::Forbidden(
                "only the author may delete a message".to_string(),
            ));
        }

        // Redundant marking is allowed; the flag never reverts.
        let row = sqlx::query(
            r#"
            UPDATE chat_messages SET deleted = TRUE WHERE id = $1
            RETURNING id, author_id, author_display_name, author_avatar_url,
                      text, channel, deleted, created_at
            "#,
        )
        .bind(message_id)
        .fetch_one(&self.pool)
        .await?;

        row_to_message(&row)
    }
}
