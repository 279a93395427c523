use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::PgRegistry;
use crate::settings::{
    RegistryError,
    registry::{RegistryResult, WebhookRegistry},
    types::{ListOptions, Webhook},
};

fn webhook_from_row(row: &PgRow) -> RegistryResult<Webhook> {
    Ok(Webhook {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        url: row.try_get("url")?,
        content_type: row.try_get("content_type")?,
        events: row.try_get("events")?,
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl WebhookRegistry for PgRegistry {
    async fn list(&self, owner_id: Uuid, opts: ListOptions) -> RegistryResult<Vec<Webhook>> {
        let rows = if let Some((limit, offset)) = opts.limit_offset() {
            let query = r"
                SELECT id, owner_id, url, content_type, events, is_active
                FROM webhooks
                WHERE owner_id = $1
                ORDER BY created_at, id
                LIMIT $2 OFFSET $3
            ";
            sqlx::query(query)
                .bind(owner_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
        } else {
            let query = r"
                SELECT id, owner_id, url, content_type, events, is_active
                FROM webhooks
                WHERE owner_id = $1
                ORDER BY created_at, id
            ";
            sqlx::query(query)
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
        };

        rows.iter().map(webhook_from_row).collect()
    }

    async fn delete(&self, owner_id: Uuid, webhook_id: Uuid) -> RegistryResult<()> {
        let deleted = sqlx::query("DELETE FROM webhooks WHERE id = $1 AND owner_id = $2")
            .bind(webhook_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RegistryError::NotFound);
        }
        Ok(())
    }
}
