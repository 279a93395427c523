//! Organization settings controller.
//!
//! `OrgSettings` orchestrates every administrative mutation of an
//! organization: rename and field updates, the visibility cascade, avatar
//! delegation, deletion, webhook and runner bookkeeping. It keeps the
//! organization, its repositories, webhooks, and runner credentials coherent
//! while talking to each record store only through the traits in `registry`.
//!
//! Every operation takes an explicit `ActorContext` and/or
//! `OrganizationTarget`; there is no ambient request state.
//!
//! Consistency notes:
//! - Name uniqueness is enforced by the directory (unique `lower_name`); this
//!   controller performs no locking of its own.
//! - The visibility cascade is sequential and NOT transactional. A failing
//!   repository update aborts the rest of the cascade and the already-updated
//!   repositories keep their new visibility. The failure surfaces as a server
//!   error so the actor can retry the change.
//! - Deleting a hosted runner invalidates its secret in the credential cache
//!   synchronously, before the response is produced.

mod avatar;
pub mod credentials;
mod delete;
pub mod error;
mod hooks;
pub mod outcome;
pub mod registry;
mod runners;
pub mod types;
mod update;

use std::sync::Arc;

use registry::{
    AvatarStore, Directory, RepositoryRegistry, RunnerCredentials, RunnerRegistry, WebhookRegistry,
};

pub use credentials::SecretCache;
pub use error::{Rejection, RegistryError, SettingsError};
pub use outcome::{Flash, Outcome, View};
pub use types::{ActorContext, OrganizationTarget};

/// Label templates offered when the deployment configures none.
pub const DEFAULT_LABEL_TEMPLATES: [&str; 2] = ["Default", "Advanced"];

/// The collaborators the controller is wired with.
#[derive(Clone)]
pub struct Registries {
    pub directory: Arc<dyn Directory>,
    pub repositories: Arc<dyn RepositoryRegistry>,
    pub webhooks: Arc<dyn WebhookRegistry>,
    pub runners: Arc<dyn RunnerRegistry>,
    pub credentials: Arc<dyn RunnerCredentials>,
    pub avatars: Arc<dyn AvatarStore>,
}

pub struct OrgSettings {
    directory: Arc<dyn Directory>,
    repositories: Arc<dyn RepositoryRegistry>,
    webhooks: Arc<dyn WebhookRegistry>,
    runners: Arc<dyn RunnerRegistry>,
    credentials: Arc<dyn RunnerCredentials>,
    avatars: Arc<dyn AvatarStore>,
    label_templates: Vec<String>,
}

impl OrgSettings {
    #[must_use]
    pub fn new(registries: Registries, label_templates: Vec<String>) -> Self {
        let label_templates = if label_templates.is_empty() {
            DEFAULT_LABEL_TEMPLATES.iter().map(ToString::to_string).collect()
        } else {
            label_templates
        };
        Self {
            directory: registries.directory,
            repositories: registries.repositories,
            webhooks: registries.webhooks,
            runners: registries.runners,
            credentials: registries.credentials,
            avatars: registries.avatars,
            label_templates,
        }
    }

    /// Directory used by the HTTP layer to resolve targets.
    #[must_use]
    pub fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }

    /// Runner registry used to resolve bearer secrets on cache misses.
    #[must_use]
    pub fn runner_registry(&self) -> &dyn RunnerRegistry {
        self.runners.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod fakes;
