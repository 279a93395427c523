//! Owned repositories and the visibility side effect of a cascade.

use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

use super::{PgRegistry, parse_column};
use crate::settings::{
    RegistryError,
    registry::{RegistryResult, RepositoryRegistry},
    types::{ListOptions, Repository, Visibility},
};

fn repository_from_row(row: &PgRow) -> RegistryResult<Repository> {
    Ok(Repository {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        is_private: row.try_get("is_private")?,
        owner_visibility: parse_column(row, "owner_visibility")?,
    })
}

#[async_trait]
impl RepositoryRegistry for PgRegistry {
    async fn list_owned(
        &self,
        owner_id: Uuid,
        opts: ListOptions,
    ) -> RegistryResult<Vec<Repository>> {
        let rows = if let Some((limit, offset)) = opts.limit_offset() {
            let query = r"
                SELECT id, owner_id, name, is_private, owner_visibility
                FROM repositories
                WHERE owner_id = $1
                ORDER BY lower_name
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
                SELECT id, owner_id, name, is_private, owner_visibility
                FROM repositories
                WHERE owner_id = $1
                ORDER BY lower_name
            ";
            sqlx::query(query)
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
        };

        rows.iter().map(repository_from_row).collect()
    }

    /// Writes the row and, for a cascaded change that leaves the repository
    /// not public, revokes access granted to accounts outside the owning
    /// organization. Both happen in one transaction.
    async fn update(&self, repo: &Repository, visibility_cascaded: bool) -> RegistryResult<()> {
        let mut tx = self.pool.begin().await?;

        let query = r"
            UPDATE repositories
            SET name = $2,
                lower_name = $3,
                is_private = $4,
                owner_visibility = $5,
                updated_at = NOW()
            WHERE id = $1
        ";
        let updated = sqlx::query(query)
            .bind(repo.id)
            .bind(&repo.name)
            .bind(repo.name.to_lowercase())
            .bind(repo.is_private)
            .bind(repo.owner_visibility.as_str())
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Err(RegistryError::NotFound);
        }

        if visibility_cascaded && repo.effective_visibility() != Visibility::Public {
            let query = r"
                DELETE FROM access a
                WHERE a.repo_id = $1
                  AND NOT EXISTS (
                      SELECT 1 FROM org_members m
                      WHERE m.org_id = $2 AND m.account_id = a.account_id
                  )
                  AND NOT EXISTS (
                      SELECT 1 FROM org_owners o
                      WHERE o.org_id = $2 AND o.account_id = a.account_id
                  )
            ";
            let revoked = sqlx::query(query)
                .bind(repo.id)
                .bind(repo.owner_id)
                .execute(&mut *tx)
                .await?;
            debug!(
                repo = %repo.name,
                revoked = revoked.rows_affected(),
                "revoked outside access"
            );
        }

        tx.commit().await?;
        Ok(())
    }
}
