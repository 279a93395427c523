//! Account records: names, organization fields, passwords, deletion.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{Row, postgres::PgRow};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{PgRegistry, is_unique_violation, parse_column};
use crate::settings::{
    RegistryError,
    registry::{Directory, RegistryResult},
    types::Organization,
};

/// Words that would shadow application routes if used as an account name.
const RESERVED_NAMES: &[&str] = &[
    ".", "..", "admin", "api", "assets", "attachments", "avatars", "captcha", "commits", "debug",
    "error", "explore", "favicon.ico", "ghost", "help", "install", "issues", "less", "login",
    "metrics", "milestones", "new", "notifications", "org", "plugins", "pulls", "raw", "repo",
    "robots.txt", "search", "settings", "stars", "swagger-ui", "template", "user",
];

const ORGANIZATION_COLUMNS: &str = r"
    a.id, a.name, a.lower_name, a.full_name, a.description, a.website, a.location,
    a.visibility, a.repo_admin_change_team_access, a.max_repo_creation,
    a.avatar, a.use_custom_avatar,
    (SELECT COUNT(*) FROM repositories r WHERE r.owner_id = a.id) AS num_repos
";

/// Character set, edge characters, reserved words and the `.git` suffix.
#[must_use]
pub fn is_legal_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    Regex::new(r"^[A-Za-z0-9_.-]+$").is_ok_and(|re| re.is_match(name))
        && !name.starts_with(['.', '-'])
        && !name.ends_with(['.', '-'])
        && !lower.ends_with(".git")
        && !RESERVED_NAMES.contains(&lower.as_str())
}

fn organization_from_row(row: &PgRow) -> RegistryResult<Organization> {
    Ok(Organization {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        lower_name: row.try_get("lower_name")?,
        full_name: row.try_get("full_name")?,
        description: row.try_get("description")?,
        website: row.try_get("website")?,
        location: row.try_get("location")?,
        visibility: parse_column(row, "visibility")?,
        repo_admin_change_team_access: row.try_get("repo_admin_change_team_access")?,
        max_repo_creation: row.try_get("max_repo_creation")?,
        num_repos: row.try_get("num_repos")?,
        avatar: row.try_get("avatar")?,
        use_custom_avatar: row.try_get("use_custom_avatar")?,
    })
}

/// Verifies `password` against a stored Argon2 PHC string.
fn verify_phc(password: &SecretString, hash: &str) -> RegistryResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|err| RegistryError::Backend(err.to_string()))?;
    match Argon2::default().verify_password(password.expose_secret().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(RegistryError::Backend(err.to_string())),
    }
}

#[async_trait]
impl Directory for PgRegistry {
    async fn name_exists(&self, exclude_id: Uuid, name: &str) -> RegistryResult<bool> {
        let query = r"
            SELECT EXISTS (
                SELECT 1 FROM accounts WHERE lower_name = $1 AND id <> $2
            )
        ";
        let exists: bool = sqlx::query_scalar(query)
            .bind(name.to_lowercase())
            .bind(exclude_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    #[instrument(skip(self, account), fields(from = %account.name))]
    async fn rename(&self, account: &Organization, new_name: &str) -> RegistryResult<()> {
        if !is_legal_name(new_name) {
            return Err(RegistryError::NameIllegal(new_name.to_string()));
        }

        let query = r"
            UPDATE accounts
            SET name = $2, lower_name = $3, updated_at = NOW()
            WHERE id = $1
        ";
        let result = sqlx::query(query)
            .bind(account.id)
            .bind(new_name)
            .bind(new_name.to_lowercase())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(RegistryError::NotFound),
            Ok(_) => {
                debug!("account renamed");
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => Err(RegistryError::NameTaken),
            Err(err) => Err(err.into()),
        }
    }

    async fn persist(&self, account: &Organization) -> RegistryResult<()> {
        let query = r"
            UPDATE accounts
            SET name = $2,
                lower_name = $3,
                full_name = $4,
                description = $5,
                website = $6,
                location = $7,
                visibility = $8,
                repo_admin_change_team_access = $9,
                max_repo_creation = $10,
                updated_at = NOW()
            WHERE id = $1 AND kind = 'organization'
        ";
        let result = sqlx::query(query)
            .bind(account.id)
            .bind(&account.name)
            .bind(&account.lower_name)
            .bind(&account.full_name)
            .bind(&account.description)
            .bind(&account.website)
            .bind(&account.location)
            .bind(account.visibility.as_str())
            .bind(account.repo_admin_change_team_access)
            .bind(account.max_repo_creation)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(RegistryError::NotFound),
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(RegistryError::NameTaken),
            Err(err) => Err(err.into()),
        }
    }

    async fn verify_password(
        &self,
        account_id: Uuid,
        password: &SecretString,
    ) -> RegistryResult<()> {
        let query = r"
            SELECT password_hash FROM accounts
            WHERE id = $1 AND kind = 'user'
        ";
        let hash: Option<Option<String>> = sqlx::query_scalar(query)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        // Unknown account, account without a password, and wrong password look the same.
        let Some(Some(hash)) = hash else {
            return Err(RegistryError::AccountNotFound);
        };
        if verify_phc(password, &hash)? {
            Ok(())
        } else {
            Err(RegistryError::AccountNotFound)
        }
    }

    #[instrument(skip(self, org), fields(org = %org.name))]
    async fn delete_organization(&self, org: &Organization) -> RegistryResult<()> {
        let mut tx = self.pool.begin().await?;

        let owned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM repositories WHERE owner_id = $1")
                .bind(org.id)
                .fetch_one(&mut *tx)
                .await?;
        if owned > 0 {
            let _ = tx.rollback().await;
            return Err(RegistryError::StillOwnsRepos(owned));
        }

        // Webhooks, runners, owners and members go with the account row.
        let deleted = sqlx::query("DELETE FROM accounts WHERE id = $1 AND kind = 'organization'")
            .bind(org.id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Err(RegistryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_organization(&self, name: &str) -> RegistryResult<Option<Organization>> {
        let query = format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM accounts a \
             WHERE a.lower_name = $1 AND a.kind = 'organization'"
        );
        let row = sqlx::query(&query)
            .bind(name.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(organization_from_row).transpose()
    }

    async fn is_owner(&self, org_id: Uuid, account_id: Uuid) -> RegistryResult<bool> {
        let query = r"
            SELECT EXISTS (
                SELECT 1 FROM org_owners WHERE org_id = $1 AND account_id = $2
            )
        ";
        let owner: bool = sqlx::query_scalar(query)
            .bind(org_id)
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    #[test]
    fn legal_names() {
        for name in ["acme", "Acme-Corp", "a.b_c", "x1"] {
            assert!(is_legal_name(name), "{name} should be legal");
        }
    }

    #[test]
    fn illegal_names() {
        for name in [
            "", "-acme", "acme-", ".acme", "acme.", "ac me", "acme.git", "ACME.GIT", "admin",
            "Settings", "api", "acme/other",
        ] {
            assert!(!is_legal_name(name), "{name} should be illegal");
        }
    }

    #[test]
    fn phc_verification() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"correct-horse", &salt)
            .map(|hash| hash.to_string())
            .expect("hash");

        assert!(matches!(
            verify_phc(&SecretString::from("correct-horse"), &hash),
            Ok(true)
        ));
        assert!(matches!(
            verify_phc(&SecretString::from("battery-staple"), &hash),
            Ok(false)
        ));
        assert!(matches!(
            verify_phc(&SecretString::from("x"), "not-a-phc-string"),
            Err(RegistryError::Backend(_))
        ));
    }
}
