//! In-memory registries that record every call, for controller and handler tests.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use uuid::Uuid;

use super::{
    OrgSettings, Registries,
    error::RegistryError,
    registry::{
        AvatarStore, Directory, RegistryResult, RepositoryRegistry, RunnerCredentials,
        RunnerRegistry, Sessions, WebhookRegistry,
    },
    types::{
        ActorContext, AvatarForm, AvatarSource, BuildRunner, ListOptions, Organization,
        Repository, RunnerKind, Visibility, Webhook,
    },
};

pub(crate) const RESERVED: [&str; 3] = ["admin", "api", "new"];

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

pub(crate) fn organization(name: &str, visibility: Visibility, num_repos: i64) -> Organization {
    Organization {
        id: Uuid::new_v4(),
        name: name.to_string(),
        lower_name: name.to_lowercase(),
        full_name: String::new(),
        description: String::new(),
        website: String::new(),
        location: String::new(),
        visibility,
        repo_admin_change_team_access: false,
        max_repo_creation: -1,
        num_repos,
        avatar: None,
        use_custom_avatar: false,
    }
}

#[derive(Default)]
pub(crate) struct FakeDirectory {
    /// lower name -> account id, for every account (users and organizations).
    names: Mutex<HashMap<String, Uuid>>,
    organizations: Mutex<HashMap<Uuid, Organization>>,
    owners: Mutex<HashSet<(Uuid, Uuid)>>,
    passwords: Mutex<HashMap<Uuid, String>>,
    owned_repos: Mutex<HashMap<Uuid, i64>>,
    pub(crate) name_checks: AtomicUsize,
    pub(crate) renames: Mutex<Vec<String>>,
    pub(crate) persisted: Mutex<Vec<Organization>>,
    pub(crate) deleted: Mutex<Vec<Uuid>>,
    pub(crate) fail_persist: AtomicBool,
    pub(crate) fail_password_backend: AtomicBool,
    /// Makes the next renames lose a race on the unique name index.
    pub(crate) lose_rename_race: AtomicBool,
}

impl FakeDirectory {
    pub(crate) fn add_user(&self, name: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        lock(&self.names).insert(name.to_lowercase(), id);
        lock(&self.passwords).insert(id, password.to_string());
        id
    }

    pub(crate) fn add_organization(&self, org: &Organization, owned_repos: i64) {
        lock(&self.names).insert(org.lower_name.clone(), org.id);
        lock(&self.organizations).insert(org.id, org.clone());
        lock(&self.owned_repos).insert(org.id, owned_repos);
    }

    pub(crate) fn add_owner(&self, org_id: Uuid, account_id: Uuid) {
        lock(&self.owners).insert((org_id, account_id));
    }

    pub(crate) fn stored(&self, org_id: Uuid) -> Option<Organization> {
        lock(&self.organizations).get(&org_id).cloned()
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn name_exists(&self, exclude_id: Uuid, name: &str) -> RegistryResult<bool> {
        self.name_checks.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.names)
            .get(&name.to_lowercase())
            .is_some_and(|id| *id != exclude_id))
    }

    async fn rename(&self, account: &Organization, new_name: &str) -> RegistryResult<()> {
        let lower = new_name.to_lowercase();
        if RESERVED.contains(&lower.as_str()) {
            return Err(RegistryError::NameIllegal(new_name.to_string()));
        }
        if self.lose_rename_race.load(Ordering::SeqCst) {
            return Err(RegistryError::NameTaken);
        }
        lock(&self.renames).push(new_name.to_string());
        let mut names = lock(&self.names);
        names.remove(&account.lower_name);
        names.insert(lower.clone(), account.id);
        if let Some(stored) = lock(&self.organizations).get_mut(&account.id) {
            stored.name = new_name.to_string();
            stored.lower_name = lower;
        }
        Ok(())
    }

    async fn persist(&self, account: &Organization) -> RegistryResult<()> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend("persist unavailable".to_string()));
        }
        lock(&self.persisted).push(account.clone());
        lock(&self.organizations).insert(account.id, account.clone());
        Ok(())
    }

    async fn verify_password(
        &self,
        account_id: Uuid,
        password: &SecretString,
    ) -> RegistryResult<()> {
        if self.fail_password_backend.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend("sign-in unavailable".to_string()));
        }
        match lock(&self.passwords).get(&account_id) {
            Some(stored) if stored == password.expose_secret() => Ok(()),
            _ => Err(RegistryError::AccountNotFound),
        }
    }

    async fn delete_organization(&self, org: &Organization) -> RegistryResult<()> {
        let owned = lock(&self.owned_repos).get(&org.id).copied().unwrap_or(0);
        if owned > 0 {
            return Err(RegistryError::StillOwnsRepos(owned));
        }
        lock(&self.organizations).remove(&org.id);
        lock(&self.names).remove(&org.lower_name);
        lock(&self.deleted).push(org.id);
        Ok(())
    }

    async fn find_organization(&self, name: &str) -> RegistryResult<Option<Organization>> {
        let lower = name.to_lowercase();
        Ok(lock(&self.organizations)
            .values()
            .find(|org| org.lower_name == lower)
            .cloned())
    }

    async fn is_owner(&self, org_id: Uuid, account_id: Uuid) -> RegistryResult<bool> {
        Ok(lock(&self.owners).contains(&(org_id, account_id)))
    }
}

#[derive(Default)]
pub(crate) struct FakeRepositories {
    repositories: Mutex<Vec<Repository>>,
    pub(crate) list_calls: Mutex<Vec<ListOptions>>,
    pub(crate) updates: Mutex<Vec<(Repository, bool)>>,
    /// Zero-based index of the update call that fails.
    pub(crate) fail_update_at: Mutex<Option<usize>>,
}

impl FakeRepositories {
    pub(crate) fn seed(&self, owner: &Organization, name: &str, is_private: bool) -> Repository {
        let repository = Repository {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            name: name.to_string(),
            is_private,
            owner_visibility: owner.visibility,
        };
        lock(&self.repositories).push(repository.clone());
        repository
    }

    pub(crate) fn update_count(&self) -> usize {
        lock(&self.updates).len()
    }
}

#[async_trait]
impl RepositoryRegistry for FakeRepositories {
    async fn list_owned(
        &self,
        owner_id: Uuid,
        opts: ListOptions,
    ) -> RegistryResult<Vec<Repository>> {
        lock(&self.list_calls).push(opts);
        Ok(lock(&self.repositories)
            .iter()
            .filter(|repo| repo.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update(&self, repo: &Repository, visibility_cascaded: bool) -> RegistryResult<()> {
        let mut updates = lock(&self.updates);
        if *lock(&self.fail_update_at) == Some(updates.len()) {
            return Err(RegistryError::Backend("repository update failed".to_string()));
        }
        updates.push((repo.clone(), visibility_cascaded));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeWebhooks {
    webhooks: Mutex<Vec<Webhook>>,
    pub(crate) fail_list: AtomicBool,
}

impl FakeWebhooks {
    pub(crate) fn seed(&self, owner_id: Uuid, url: &str) -> Webhook {
        let webhook = Webhook {
            id: Uuid::new_v4(),
            owner_id,
            url: url.to_string(),
            content_type: "json".to_string(),
            events: serde_json::json!({"push_only": true}),
            is_active: true,
        };
        lock(&self.webhooks).push(webhook.clone());
        webhook
    }

    pub(crate) fn count(&self) -> usize {
        lock(&self.webhooks).len()
    }
}

#[async_trait]
impl WebhookRegistry for FakeWebhooks {
    async fn list(&self, owner_id: Uuid, _opts: ListOptions) -> RegistryResult<Vec<Webhook>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend("webhook listing failed".to_string()));
        }
        Ok(lock(&self.webhooks)
            .iter()
            .filter(|hook| hook.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, owner_id: Uuid, webhook_id: Uuid) -> RegistryResult<()> {
        let mut webhooks = lock(&self.webhooks);
        let before = webhooks.len();
        webhooks.retain(|hook| !(hook.owner_id == owner_id && hook.id == webhook_id));
        if webhooks.len() == before {
            return Err(RegistryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeRunners {
    runners: Mutex<Vec<BuildRunner>>,
    secret_lookups: AtomicUsize,
    pub(crate) created: Mutex<Vec<(Uuid, RunnerKind)>>,
    pub(crate) fail_create: AtomicBool,
}

impl FakeRunners {
    pub(crate) fn seed(&self, owner_id: Uuid, kind: RunnerKind) -> BuildRunner {
        let runner = BuildRunner {
            id: Uuid::new_v4(),
            owner_id,
            kind,
            secret: SecretString::from(Uuid::new_v4().simple().to_string()),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        lock(&self.runners).push(runner.clone());
        runner
    }

    pub(crate) fn secret_lookups(&self) -> usize {
        self.secret_lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn count(&self) -> usize {
        lock(&self.runners).len()
    }
}

#[async_trait]
impl RunnerRegistry for FakeRunners {
    async fn list(&self, owner_id: Uuid, _opts: ListOptions) -> RegistryResult<Vec<BuildRunner>> {
        Ok(lock(&self.runners)
            .iter()
            .filter(|runner| runner.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, owner_id: Uuid, kind: RunnerKind) -> RegistryResult<BuildRunner> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend("runner creation failed".to_string()));
        }
        lock(&self.created).push((owner_id, kind));
        Ok(self.seed(owner_id, kind))
    }

    async fn delete(&self, owner_id: Uuid, runner_id: Uuid) -> RegistryResult<BuildRunner> {
        let mut runners = lock(&self.runners);
        let position = runners
            .iter()
            .position(|runner| runner.owner_id == owner_id && runner.id == runner_id)
            .ok_or(RegistryError::NotFound)?;
        Ok(runners.remove(position))
    }

    async fn find_by_secret(&self, secret: &SecretString) -> RegistryResult<Option<BuildRunner>> {
        self.secret_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.runners)
            .iter()
            .find(|runner| runner.secret.expose_secret() == secret.expose_secret())
            .cloned())
    }
}

#[derive(Default)]
pub(crate) struct RecordingCredentials {
    pub(crate) invalidated: Mutex<Vec<String>>,
}

impl RecordingCredentials {
    pub(crate) fn invalidations(&self) -> Vec<String> {
        lock(&self.invalidated).clone()
    }
}

impl RunnerCredentials for RecordingCredentials {
    fn invalidate(&self, secret: &SecretString) {
        lock(&self.invalidated).push(secret.expose_secret().to_string());
    }
}

#[derive(Default)]
pub(crate) struct FakeAvatars {
    pub(crate) uploads: Mutex<Vec<(Uuid, AvatarSource, usize)>>,
    pub(crate) removals: AtomicUsize,
    pub(crate) fail: AtomicBool,
}

#[async_trait]
impl AvatarStore for FakeAvatars {
    async fn update_avatar(&self, org: &Organization, form: &AvatarForm) -> RegistryResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryError::Avatar("unsupported image format".to_string()));
        }
        lock(&self.uploads).push((org.id, form.source, form.content.len()));
        Ok(())
    }

    async fn delete_avatar(&self, _org: &Organization) -> RegistryResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryError::Avatar("avatar store unavailable".to_string()));
        }
        self.removals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Session token -> actor.
#[derive(Default)]
pub(crate) struct FakeSessions {
    actors: Mutex<HashMap<String, ActorContext>>,
}

impl FakeSessions {
    pub(crate) fn sign_in(&self, token: &str, actor: ActorContext) {
        lock(&self.actors).insert(token.to_string(), actor);
    }
}

#[async_trait]
impl Sessions for FakeSessions {
    async fn actor(&self, token: &str) -> RegistryResult<Option<ActorContext>> {
        Ok(lock(&self.actors).get(token).cloned())
    }
}

/// Every fake plus a controller wired to them.
pub(crate) struct Harness {
    pub(crate) directory: Arc<FakeDirectory>,
    pub(crate) repositories: Arc<FakeRepositories>,
    pub(crate) webhooks: Arc<FakeWebhooks>,
    pub(crate) runners: Arc<FakeRunners>,
    pub(crate) credentials: Arc<RecordingCredentials>,
    pub(crate) avatars: Arc<FakeAvatars>,
    pub(crate) settings: Arc<OrgSettings>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let directory = Arc::new(FakeDirectory::default());
        let repositories = Arc::new(FakeRepositories::default());
        let webhooks = Arc::new(FakeWebhooks::default());
        let runners = Arc::new(FakeRunners::default());
        let credentials = Arc::new(RecordingCredentials::default());
        let avatars = Arc::new(FakeAvatars::default());
        let settings = Arc::new(OrgSettings::new(
            Registries {
                directory: directory.clone(),
                repositories: repositories.clone(),
                webhooks: webhooks.clone(),
                runners: runners.clone(),
                credentials: credentials.clone(),
                avatars: avatars.clone(),
            },
            Vec::new(),
        ));
        Self {
            directory,
            repositories,
            webhooks,
            runners,
            credentials,
            avatars,
            settings,
        }
    }

    /// Same fakes, but invalidations go to `credentials` instead of the recorder.
    pub(crate) fn registries_with(&self, credentials: Arc<dyn RunnerCredentials>) -> Registries {
        Registries {
            directory: self.directory.clone(),
            repositories: self.repositories.clone(),
            webhooks: self.webhooks.clone(),
            runners: self.runners.clone(),
            credentials,
            avatars: self.avatars.clone(),
        }
    }
}
