//! Collaborator contracts consumed by the settings controller.
//!
//! Every registry is an object-safe async trait so the server wires Postgres
//! adapters while tests wire in-memory fakes. The controller never reaches a
//! registry except through these traits.

use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use super::{
    error::RegistryError,
    types::{
        ActorContext, AvatarForm, BuildRunner, ListOptions, Organization, Repository, RunnerKind,
        Webhook,
    },
};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Canonical account records. Organizations and users share one namespace.
#[async_trait]
pub trait Directory: Send + Sync {
    /// `true` if an account other than `exclude_id` already uses `name` (case-insensitive).
    async fn name_exists(&self, exclude_id: Uuid, name: &str) -> RegistryResult<bool>;

    /// Renames the account; fails with `NameIllegal` for reserved or malformed names.
    async fn rename(&self, account: &Organization, new_name: &str) -> RegistryResult<()>;

    async fn persist(&self, account: &Organization) -> RegistryResult<()>;

    /// Fails with `AccountNotFound` for an unknown account or a wrong password.
    async fn verify_password(&self, account_id: Uuid, password: &SecretString)
        -> RegistryResult<()>;

    /// Fails with `StillOwnsRepos` while the organization owns any repository.
    async fn delete_organization(&self, org: &Organization) -> RegistryResult<()>;

    async fn find_organization(&self, name: &str) -> RegistryResult<Option<Organization>>;

    async fn is_owner(&self, org_id: Uuid, account_id: Uuid) -> RegistryResult<bool>;
}

#[async_trait]
pub trait RepositoryRegistry: Send + Sync {
    async fn list_owned(&self, owner_id: Uuid, opts: ListOptions)
        -> RegistryResult<Vec<Repository>>;

    /// `visibility_cascaded` asks the registry to apply visibility side effects.
    async fn update(&self, repo: &Repository, visibility_cascaded: bool) -> RegistryResult<()>;
}

#[async_trait]
pub trait WebhookRegistry: Send + Sync {
    async fn list(&self, owner_id: Uuid, opts: ListOptions) -> RegistryResult<Vec<Webhook>>;

    async fn delete(&self, owner_id: Uuid, webhook_id: Uuid) -> RegistryResult<()>;
}

#[async_trait]
pub trait RunnerRegistry: Send + Sync {
    async fn list(&self, owner_id: Uuid, opts: ListOptions) -> RegistryResult<Vec<BuildRunner>>;

    /// Creates a runner with a freshly generated secret.
    async fn create(&self, owner_id: Uuid, kind: RunnerKind) -> RegistryResult<BuildRunner>;

    /// Returns the deleted record so callers can inspect its kind and secret.
    async fn delete(&self, owner_id: Uuid, runner_id: Uuid) -> RegistryResult<BuildRunner>;

    async fn find_by_secret(&self, secret: &SecretString) -> RegistryResult<Option<BuildRunner>>;
}

/// Process-wide view of live runner secrets.
pub trait RunnerCredentials: Send + Sync {
    /// Forget `secret`; a runner presenting it must be re-checked against the registry.
    fn invalidate(&self, secret: &SecretString);
}

#[async_trait]
pub trait AvatarStore: Send + Sync {
    async fn update_avatar(&self, org: &Organization, form: &AvatarForm) -> RegistryResult<()>;

    async fn delete_avatar(&self, org: &Organization) -> RegistryResult<()>;
}

/// Resolves a session token to the account behind it.
#[async_trait]
pub trait Sessions: Send + Sync {
    /// `None` for unknown or expired sessions.
    async fn actor(&self, token: &str) -> RegistryResult<Option<ActorContext>>;
}
