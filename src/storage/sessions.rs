use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::Row;

use super::PgRegistry;
use crate::settings::{
    registry::{RegistryResult, Sessions},
    types::ActorContext,
};

/// Hash a session token so raw values never touch the database.
#[must_use]
pub fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

#[async_trait]
impl Sessions for PgRegistry {
    async fn actor(&self, token: &str) -> RegistryResult<Option<ActorContext>> {
        let query = r"
            SELECT a.id, a.name, a.is_admin
            FROM sessions s
            JOIN accounts a ON a.id = s.account_id
            WHERE s.session_hash = $1
              AND s.expires_at > NOW()
              AND a.kind = 'user'
        ";
        let row = sqlx::query(query)
            .bind(hash_session_token(token))
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(ActorContext {
            account_id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_admin: row.try_get("is_admin")?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_hash_is_sha256() {
        let hash = hash_session_token("token");
        assert_eq!(hash.len(), 32);
        assert_eq!(hash, hash_session_token("token"));
        assert_ne!(hash, hash_session_token("other"));
    }
}
