//! Session token resolution.
//!
//! Tokens are minted by the external login collaborator; this module only
//! maps a presented token to its identity. Unknown or expired tokens resolve
//! to `None` and callers fail closed.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::debug;

use kaiwa_core::{Identity, Result, Role, SessionResolver};

/// PostgreSQL implementation of [`SessionResolver`].
pub struct PgSessionResolver {
    pool: PgPool,
}

impl PgSessionResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionResolver for PgSessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.display_name, u.avatar_url, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
              AND (s.expires_at IS NULL OR s.expires_at > now())
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!(
                subsystem = "db",
                component = "sessions",
                "Unknown or expired session token"
            );
            return Ok(None);
        };

        let role: String = row.try_get("role")?;
        let identity = Identity {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            avatar_url: row.try_get("avatar_url")?,
            role: role.parse::<Role>()?,
        };

        sqlx::query("UPDATE users SET last_active_at = now() WHERE id = $1")
            .bind(identity.id)
            .execute(&self.pool)
            .await?;

        Ok(Some(identity))
    }
}
