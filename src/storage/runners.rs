//! Build runner records and their bearer secrets.

use async_trait::async_trait;
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::{CREATED_AT_UTC, PgRegistry, parse_column};
use crate::settings::{
    RegistryError,
    registry::{RegistryResult, RunnerRegistry},
    types::{BuildRunner, ListOptions, RunnerKind},
};

const SECRET_BYTES: usize = 32;

/// 32 random bytes, hex encoded.
fn generate_secret() -> RegistryResult<SecretString> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|err| {
        RegistryError::Backend(format!("failed to generate runner secret: {err}"))
    })?;
    Ok(SecretString::from(hex::encode(bytes)))
}

fn runner_from_row(row: &PgRow) -> RegistryResult<BuildRunner> {
    let secret: String = row.try_get("secret")?;
    Ok(BuildRunner {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        kind: parse_column(row, "kind")?,
        secret: SecretString::from(secret),
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl RunnerRegistry for PgRegistry {
    async fn list(&self, owner_id: Uuid, opts: ListOptions) -> RegistryResult<Vec<BuildRunner>> {
        let rows = if let Some((limit, offset)) = opts.limit_offset() {
            let query = format!(
                "SELECT id, owner_id, kind, secret, {CREATED_AT_UTC} FROM build_runners \
                 WHERE owner_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3"
            );
            sqlx::query(&query)
                .bind(owner_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
        } else {
            let query = format!(
                "SELECT id, owner_id, kind, secret, {CREATED_AT_UTC} FROM build_runners \
                 WHERE owner_id = $1 ORDER BY created_at, id"
            );
            sqlx::query(&query)
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
        };

        rows.iter().map(runner_from_row).collect()
    }

    async fn create(&self, owner_id: Uuid, kind: RunnerKind) -> RegistryResult<BuildRunner> {
        let secret = generate_secret()?;
        let query = format!(
            "INSERT INTO build_runners (owner_id, kind, secret) VALUES ($1, $2, $3) \
             RETURNING id, owner_id, kind, secret, {CREATED_AT_UTC}"
        );
        let row = sqlx::query(&query)
            .bind(owner_id)
            .bind(kind.as_str())
            .bind(secret.expose_secret())
            .fetch_one(&self.pool)
            .await?;
        runner_from_row(&row)
    }

    async fn delete(&self, owner_id: Uuid, runner_id: Uuid) -> RegistryResult<BuildRunner> {
        let query = format!(
            "DELETE FROM build_runners WHERE id = $1 AND owner_id = $2 \
             RETURNING id, owner_id, kind, secret, {CREATED_AT_UTC}"
        );
        let row = sqlx::query(&query)
            .bind(runner_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => runner_from_row(&row),
            None => Err(RegistryError::NotFound),
        }
    }

    async fn find_by_secret(&self, secret: &SecretString) -> RegistryResult<Option<BuildRunner>> {
        let query = format!(
            "SELECT id, owner_id, kind, secret, {CREATED_AT_UTC} FROM build_runners \
             WHERE secret = $1"
        );
        let row = sqlx::query(&query)
            .bind(secret.expose_secret())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(runner_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_hex_and_unique() {
        let first = generate_secret().expect("secret");
        let second = generate_secret().expect("secret");

        assert_eq!(first.expose_secret().len(), SECRET_BYTES * 2);
        assert!(first
            .expose_secret()
            .chars()
            .all(|ch| ch.is_ascii_hexdigit()));
        assert_ne!(first.expose_secret(), second.expose_secret());
    }
}
